// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.
//!
//! Each stored record has a matching input type for request bodies. Input
//! fields are all optional so that missing fields surface as validation
//! errors rather than JSON parse failures.

pub mod schedule;
pub mod user;
pub mod workout_plan;
pub mod workout_session;

pub use schedule::{Schedule, ScheduleInput, ScheduleUpdate};
pub use user::{NewUser, User, UserUpdate};
pub use workout_plan::{
    ExercisePlan, ExercisePlanInput, Intensity, WorkoutPlan, WorkoutPlanInput, WorkoutPlanUpdate,
};
pub use workout_session::{
    ExerciseSession, ExerciseSessionInput, ExerciseSet, ExerciseSetInput, WorkoutSession,
    WorkoutSessionInput, WorkoutSessionUpdate,
};

use crate::error::AppError;

/// Presence check used after validation, when the field is known to be set.
pub(crate) fn present<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}
