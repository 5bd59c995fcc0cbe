// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Training schedule: a date range over a set of workout plans.

use super::present;
use crate::db::{collections, Entity};
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Stored in `schedules`; a user points at most one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// WorkoutPlan ids, in schedule order
    #[serde(default)]
    pub workout_plans: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Accept either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date, which
/// is read as midnight UTC.
fn flexible_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(|date| Some(date.and_time(chrono::NaiveTime::MIN).and_utc()))
        .map_err(|_| {
            serde::de::Error::custom(format!(
                "invalid date `{}`, expected YYYY-MM-DD or an RFC 3339 timestamp",
                raw
            ))
        })
}

impl Entity for Schedule {
    const COLLECTION: &'static str = collections::SCHEDULES;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Create body for `POST /schedule/{user_id}`. Plans are referenced by id
/// and must already exist.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    #[validate(required(message = "startDate is required"))]
    #[serde(default, deserialize_with = "flexible_date")]
    pub start_date: Option<DateTime<Utc>>,
    #[validate(required(message = "endDate is required"))]
    #[serde(default, deserialize_with = "flexible_date")]
    pub end_date: Option<DateTime<Utc>>,
    #[validate(required(message = "workoutPlans is required"))]
    pub workout_plans: Option<Vec<String>>,
}

impl ScheduleInput {
    pub fn into_record(self, now: DateTime<Utc>) -> Result<Schedule, AppError> {
        self.validate()?;
        Ok(Schedule {
            id: String::new(),
            start_date: present(self.start_date, "startDate")?,
            end_date: present(self.end_date, "endDate")?,
            workout_plans: present(self.workout_plans, "workoutPlans")?,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Update body for `PUT /schedule/{id}`; only present fields are written.
///
/// `updatedAt` is always the server's clock; a client-sent value is ignored.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    #[serde(
        default,
        deserialize_with = "flexible_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "flexible_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_plans: Option<Vec<String>>,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}
