// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schedule routes.

use super::{take_field, ApiResponse};
use crate::db::Expand;
use crate::error::{AppError, Result};
use crate::models::{Schedule, ScheduleInput, ScheduleUpdate, User, WorkoutPlan};
use crate::services::UserChild;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

const SCHEDULE_NOT_FOUND: &str = "Schedule not found";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/schedule/{id}",
        get(get_schedule)
            .post(create_schedule)
            .put(update_schedule)
            .delete(delete_schedule),
    )
}

fn user_schedule() -> Expand {
    Expand::none().path("schedule.workoutPlans.exercises")
}

fn schedule_plans() -> Expand {
    Expand::none().path("workoutPlans.exercises")
}

/// Every id must name an existing workout plan.
async fn check_plans(state: &AppState, ids: &[String]) -> Result<()> {
    let missing = state.relations.missing::<WorkoutPlan>(ids).await?;
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Workout plan not found: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// `{id}` names a user (their schedule) or a schedule.
async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    if let Some(user) = state.db.get_expanded::<User>(&id, &user_schedule()).await? {
        return match take_field(user, "schedule") {
            Value::Null => Err(AppError::NotFound(SCHEDULE_NOT_FOUND.to_string())),
            schedule => Ok(ApiResponse::success(schedule)),
        };
    }

    let schedule = state
        .db
        .get_expanded::<Schedule>(&id, &schedule_plans())
        .await?
        .ok_or_else(|| AppError::NotFound(SCHEDULE_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::success(schedule))
}

/// Create a schedule for user `{id}`, replacing their current one.
async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<ScheduleInput>, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<Schedule>>)> {
    let schedule = body.into_record(Utc::now())?;
    check_plans(&state, &schedule.workout_plans).await?;

    let schedule = state.db.insert(&schedule).await?;

    if let Err(e) = state
        .relations
        .link_to_user(&user_id, UserChild::Schedule(schedule.id.clone()))
        .await
    {
        tracing::warn!(
            user_id = %user_id,
            schedule_id = %schedule.id,
            error = %e,
            "Schedule stored but not linked to user"
        );
        return Err(e);
    }

    tracing::info!(
        user_id = %user_id,
        schedule_id = %schedule.id,
        workout_plans = schedule.workout_plans.len(),
        "Created schedule"
    );
    Ok(ApiResponse::created(schedule))
}

async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<ScheduleUpdate>, AppError>,
) -> Result<Json<ApiResponse<Schedule>>> {
    if let Some(plans) = &body.workout_plans {
        check_plans(&state, plans).await?;
    }

    let schedule = state
        .db
        .update::<Schedule, _>(&id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(SCHEDULE_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::success_with_message(
        schedule,
        "Schedule updated successfully",
    ))
}

/// The owning user's `schedule` still points here; reads treat it as unset.
async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .db
        .delete::<Schedule>(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(SCHEDULE_NOT_FOUND.to_string()))?;

    tracing::info!(schedule_id = %id, "Deleted schedule");
    Ok(ApiResponse::done(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::collections;

    #[test]
    fn test_expansions_follow_known_relations() {
        user_schedule().check(collections::USERS).unwrap();
        schedule_plans().check(collections::SCHEDULES).unwrap();
    }
}
