// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout session routes.

use super::{take_field, ApiResponse};
use crate::db::Expand;
use crate::error::{AppError, Result};
use crate::models::workout_session::WorkoutSessionPatch;
use crate::models::{present, User, WorkoutSession, WorkoutSessionInput, WorkoutSessionUpdate};
use crate::services::UserChild;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

const SESSION_NOT_FOUND: &str = "Workout session not found";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/workout_session/{id}",
            get(get_workout_sessions)
                .post(create_workout_session)
                .put(update_workout_session),
        )
        .route(
            "/workout_session/{id}/user/{user_id}",
            delete(delete_workout_session),
        )
}

/// Sessions down to individual sets.
fn user_sessions() -> Expand {
    Expand::none().path("workoutSessions.exercises.sets")
}

/// All sessions of user `{id}`, fully populated.
async fn get_workout_sessions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let user = state
        .db
        .get_expanded::<User>(&user_id, &user_sessions())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::success(take_field(user, "workoutSessions")))
}

/// Record a session for user `{id}`.
async fn create_workout_session(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<WorkoutSessionInput>, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<WorkoutSession>>)> {
    body.validate()?;
    let name = present(body.name, "name")?;
    let exercises = state
        .relations
        .resolve_exercise_sessions(present(body.exercises, "exercises")?)
        .await?;

    let now = Utc::now();
    let session = state
        .db
        .insert(&WorkoutSession {
            id: String::new(),
            name,
            exercises,
            created_at: now,
            updated_at: now,
        })
        .await?;

    if let Err(e) = state
        .relations
        .link_to_user(&user_id, UserChild::WorkoutSession(session.id.clone()))
        .await
    {
        tracing::warn!(
            user_id = %user_id,
            workout_session_id = %session.id,
            error = %e,
            "Workout session stored but not linked to user"
        );
        return Err(e);
    }

    tracing::info!(
        user_id = %user_id,
        workout_session_id = %session.id,
        exercises = session.exercises.len(),
        "Created workout session"
    );
    Ok(ApiResponse::created(session))
}

async fn update_workout_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<WorkoutSessionUpdate>, AppError>,
) -> Result<Json<ApiResponse<WorkoutSession>>> {
    body.validate()?;

    if !state.db.exists::<WorkoutSession>(&id).await? {
        return Err(AppError::NotFound(SESSION_NOT_FOUND.to_string()));
    }

    let exercises = match body.exercises {
        Some(inputs) => Some(state.relations.resolve_exercise_sessions(inputs).await?),
        None => None,
    };

    let patch = WorkoutSessionPatch {
        name: body.name,
        exercises,
        updated_at: Utc::now(),
    };

    let session = state
        .db
        .update::<WorkoutSession, _>(&id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(SESSION_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::success_with_message(
        session,
        "Workout session updated successfully",
    ))
}

/// Unlink the session from its user, then delete it.
///
/// Nothing is deleted unless the user actually held the session.
async fn delete_workout_session(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>> {
    state.relations.unlink_session(&user_id, &id).await?;

    if state.db.delete::<WorkoutSession>(&id).await?.is_none() {
        tracing::warn!(
            user_id = %user_id,
            workout_session_id = %id,
            "Removed reference to a workout session that no longer exists"
        );
    }

    tracing::info!(user_id = %user_id, workout_session_id = %id, "Deleted workout session");
    Ok(ApiResponse::done(Some("Workout session deleted")))
}
