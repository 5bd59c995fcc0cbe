// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout plans and the exercises they are built from.

use super::present;
use crate::db::{collections, Entity, Filter};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Planned effort for an exercise.
///
/// Only the lowercase names are accepted, so one spelling is stored and
/// exercise dedup never has to compare case variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            other => Err(format!(
                "invalid intensity '{}', expected low, medium or high",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Intensity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        };
        f.write_str(s)
    }
}

/// A named, ordered list of exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub category: String,
    /// ExercisePlan ids, in workout order
    #[serde(default)]
    pub exercises: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for WorkoutPlan {
    const COLLECTION: &'static str = collections::WORKOUT_PLANS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// One planned exercise. Shared between plans when the attributes match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePlan {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub description: String,
    /// Icon URL or asset name
    pub icon: String,
    pub muscle_type: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    /// Seconds
    pub rest_time: u32,
    pub intensity: Intensity,
}

impl Entity for ExercisePlan {
    const COLLECTION: &'static str = collections::EXERCISE_PLANS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Fields two exercise plans must share to be the same document.
/// `reps` is deliberately absent.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExercisePlanKey<'a> {
    name: &'a str,
    description: &'a str,
    icon: &'a str,
    muscle_type: &'a str,
    sets: u32,
    weight: f64,
    rest_time: u32,
    intensity: Intensity,
}

impl ExercisePlan {
    pub fn comparable_filter(&self) -> Result<Filter, AppError> {
        Filter::from_fields(&ExercisePlanKey {
            name: &self.name,
            description: &self.description,
            icon: &self.icon,
            muscle_type: &self.muscle_type,
            sets: self.sets,
            weight: self.weight,
            rest_time: self.rest_time,
            intensity: self.intensity,
        })
    }
}

/// Exercise as embedded in a workout plan request.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePlanInput {
    #[validate(required(message = "name is required"))]
    pub name: Option<String>,
    #[validate(required(message = "description is required"))]
    pub description: Option<String>,
    #[validate(required(message = "icon is required"))]
    pub icon: Option<String>,
    #[validate(required(message = "muscleType is required"))]
    pub muscle_type: Option<String>,
    #[validate(required(message = "sets is required"))]
    pub sets: Option<u32>,
    #[validate(required(message = "reps is required"))]
    pub reps: Option<u32>,
    #[validate(required(message = "weight is required"))]
    pub weight: Option<f64>,
    #[validate(required(message = "restTime is required"))]
    pub rest_time: Option<u32>,
    #[validate(required(message = "intensity is required"))]
    pub intensity: Option<Intensity>,
}

impl ExercisePlanInput {
    pub fn into_record(self) -> Result<ExercisePlan, AppError> {
        self.validate()?;
        Ok(ExercisePlan {
            id: String::new(),
            name: present(self.name, "name")?,
            description: present(self.description, "description")?,
            icon: present(self.icon, "icon")?,
            muscle_type: present(self.muscle_type, "muscleType")?,
            sets: present(self.sets, "sets")?,
            reps: present(self.reps, "reps")?,
            weight: present(self.weight, "weight")?,
            rest_time: present(self.rest_time, "restTime")?,
            intensity: present(self.intensity, "intensity")?,
        })
    }
}

/// Create body for `POST /workout_plan/{user_id}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanInput {
    #[validate(required(message = "name is required"))]
    pub name: Option<String>,
    #[validate(required(message = "category is required"))]
    pub category: Option<String>,
    #[validate(required(message = "exercises is required"), nested)]
    pub exercises: Option<Vec<ExercisePlanInput>>,
}

/// Update body for `PUT /workout_plan/{id}`; absent fields are left alone.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    #[validate(nested)]
    pub exercises: Option<Vec<ExercisePlanInput>>,
}

/// Fields written by a workout plan update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkoutPlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}
