// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use super::present;
use crate::db::{collections, Entity};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User profile stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// Unique across users
    pub email: String,
    /// Signup time
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Profile picture URL
    #[serde(default)]
    pub picture: Option<String>,
    /// At most one schedule per user
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub workout_plans: Vec<String>,
    #[serde(default)]
    pub workout_sessions: Vec<String>,
}

impl Entity for User {
    const COLLECTION: &'static str = collections::USERS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Signup request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(required(message = "firstName is required"))]
    pub first_name: Option<String>,
    #[validate(required(message = "lastName is required"))]
    pub last_name: Option<String>,
    /// Defaults to "first last"
    pub full_name: Option<String>,
    #[validate(required(message = "email is required"))]
    pub email: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
}

impl NewUser {
    /// Validate and build the record to insert.
    pub fn into_user(self, now: DateTime<Utc>) -> Result<User, AppError> {
        self.validate()?;

        let first_name = present(self.first_name, "firstName")?;
        let last_name = present(self.last_name, "lastName")?;
        let full_name = self
            .full_name
            .unwrap_or_else(|| format!("{} {}", first_name, last_name));

        Ok(User {
            id: String::new(),
            first_name,
            last_name,
            full_name,
            email: present(self.email, "email")?,
            date: now,
            bio: self.bio,
            picture: self.picture,
            schedule: None,
            workout_plans: Vec::new(),
            workout_sessions: Vec::new(),
        })
    }
}

/// Profile update body. Only the fields present are written; reference
/// lists are maintained by the workout plan, session and schedule routes.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Points a user at a new schedule.
#[derive(Debug, Serialize)]
pub(crate) struct ScheduleLink<'a> {
    pub schedule: &'a str,
}
