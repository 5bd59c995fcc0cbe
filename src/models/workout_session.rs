// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recorded workouts: sessions, the exercises performed, and their sets.

use super::present;
use crate::db::{collections, Entity, Filter};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A completed (or in-progress) workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    /// ExerciseSession ids, in the order performed
    #[serde(default)]
    pub exercises: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for WorkoutSession {
    const COLLECTION: &'static str = collections::WORKOUT_SESSIONS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// An exercise as performed in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSession {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Stored lowercase
    pub muscle_type: String,
    pub category: String,
    /// ExerciseSet ids
    #[serde(default)]
    pub sets: Vec<String>,
}

impl Entity for ExerciseSession {
    const COLLECTION: &'static str = collections::EXERCISE_SESSIONS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseSessionKey<'a> {
    name: &'a str,
    description: &'a str,
    icon: &'a str,
    muscle_type: &'a str,
    category: &'a str,
}

impl ExerciseSession {
    /// Descriptive fields only; set lists never take part in matching.
    pub fn comparable_filter(&self) -> Result<Filter, AppError> {
        Filter::from_fields(&ExerciseSessionKey {
            name: &self.name,
            description: &self.description,
            icon: &self.icon,
            muscle_type: &self.muscle_type,
            category: &self.category,
        })
    }
}

/// One set of an exercise. Never shared: every write creates new sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub set_num: u32,
    pub weight: f64,
    /// Seconds
    pub duration: u32,
    /// Seconds
    #[serde(default)]
    pub rest_time: Option<u32>,
}

impl Entity for ExerciseSet {
    const COLLECTION: &'static str = collections::EXERCISE_SETS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSetInput {
    #[validate(required(message = "setNum is required"))]
    pub set_num: Option<u32>,
    #[validate(required(message = "weight is required"))]
    pub weight: Option<f64>,
    #[validate(required(message = "duration is required"))]
    pub duration: Option<u32>,
    pub rest_time: Option<u32>,
}

impl ExerciseSetInput {
    pub fn into_record(self) -> Result<ExerciseSet, AppError> {
        self.validate()?;
        Ok(ExerciseSet {
            id: String::new(),
            set_num: present(self.set_num, "setNum")?,
            weight: present(self.weight, "weight")?,
            duration: present(self.duration, "duration")?,
            rest_time: self.rest_time,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSessionInput {
    #[validate(required(message = "name is required"))]
    pub name: Option<String>,
    #[validate(required(message = "description is required"))]
    pub description: Option<String>,
    #[validate(required(message = "icon is required"))]
    pub icon: Option<String>,
    #[validate(required(message = "muscleType is required"))]
    pub muscle_type: Option<String>,
    #[validate(required(message = "category is required"))]
    pub category: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub sets: Vec<ExerciseSetInput>,
}

impl ExerciseSessionInput {
    /// Split into the exercise record (without set ids) and its set payloads.
    pub fn into_parts(self) -> Result<(ExerciseSession, Vec<ExerciseSetInput>), AppError> {
        self.validate()?;
        let exercise = ExerciseSession {
            id: String::new(),
            name: present(self.name, "name")?,
            description: present(self.description, "description")?,
            icon: present(self.icon, "icon")?,
            muscle_type: present(self.muscle_type, "muscleType")?.to_lowercase(),
            category: present(self.category, "category")?,
            sets: Vec::new(),
        };
        Ok((exercise, self.sets))
    }
}

/// Create body for `POST /workout_session/{user_id}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSessionInput {
    #[validate(required(message = "name is required"))]
    pub name: Option<String>,
    #[validate(required(message = "exercises is required"), nested)]
    pub exercises: Option<Vec<ExerciseSessionInput>>,
}

/// Update body for `PUT /workout_session/{id}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSessionUpdate {
    pub name: Option<String>,
    #[validate(nested)]
    pub exercises: Option<Vec<ExerciseSessionInput>>,
}

/// Fields written by a workout session update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkoutSessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_muscle_type_is_lowercased() {
        let input: ExerciseSessionInput = serde_json::from_value(json!({
            "name": "Squat",
            "description": "Back squat",
            "icon": "squat.png",
            "muscleType": "Legs",
            "category": "Strength",
            "sets": [{"setNum": 1, "weight": 225, "duration": 40}]
        }))
        .unwrap();

        let (exercise, sets) = input.into_parts().unwrap();
        assert_eq!(exercise.muscle_type, "legs");
        assert_eq!(sets.len(), 1);
        assert!(exercise.sets.is_empty());
    }

    #[test]
    fn test_set_rest_time_is_optional() {
        let input: ExerciseSetInput =
            serde_json::from_value(json!({"setNum": 2, "weight": 100.5, "duration": 30})).unwrap();
        let set = input.into_record().unwrap();
        assert_eq!(set.rest_time, None);
        assert_eq!(set.weight, 100.5);
    }

    #[test]
    fn test_set_without_duration_is_rejected() {
        let input: ExerciseSetInput =
            serde_json::from_value(json!({"setNum": 2, "weight": 100})).unwrap();
        assert!(matches!(input.into_record(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_comparable_filter_excludes_sets() {
        let exercise = ExerciseSession {
            id: String::new(),
            name: "Squat".to_string(),
            description: "Back squat".to_string(),
            icon: "squat.png".to_string(),
            muscle_type: "legs".to_string(),
            category: "Strength".to_string(),
            sets: vec!["s1".to_string()],
        };
        let filter = exercise.comparable_filter().unwrap();
        assert!(filter.fields().iter().all(|(f, _)| f != "sets"));
        assert_eq!(filter.fields().len(), 5);
    }
}
