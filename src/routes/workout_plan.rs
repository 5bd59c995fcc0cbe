// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout plan routes.

use super::{take_field, ApiResponse};
use crate::db::{Expand, Filter};
use crate::error::{AppError, Result};
use crate::models::workout_plan::WorkoutPlanPatch;
use crate::models::{present, User, WorkoutPlan, WorkoutPlanInput, WorkoutPlanUpdate};
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
use validator::Validate;

const PLAN_NOT_FOUND: &str = "Workout plan not found";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/workout_plan/{id}",
            get(get_workout_plans)
                .post(create_workout_plan)
                .put(update_workout_plan)
                .delete(delete_workout_plan),
        )
        .route(
            "/workout_plan/{id}/category/{category}",
            get(get_workout_plans_by_category),
        )
}

/// A user's plans, exercises left as ids.
fn user_plans() -> Expand {
    Expand::none().path("workoutPlans")
}

fn user_plans_in(category: &str) -> Expand {
    Expand::none().path_matching("workoutPlans", Filter::new().eq("category", category))
}

/// `{id}` names a user (all of their plans) or a single plan.
async fn get_workout_plans(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    if let Some(user) = state.db.get_expanded::<User>(&id, &user_plans()).await? {
        return Ok(ApiResponse::success(take_field(user, "workoutPlans")));
    }

    let plan = state
        .db
        .get_expanded::<WorkoutPlan>(&id, &Expand::none())
        .await?
        .ok_or_else(|| AppError::NotFound(PLAN_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::success(plan))
}

async fn get_workout_plans_by_category(
    State(state): State<Arc<AppState>>,
    Path((user_id, category)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Value>>> {
    let user = state
        .db
        .get_expanded::<User>(&user_id, &user_plans_in(&category))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::success(take_field(user, "workoutPlans")))
}

/// Create a plan for user `{id}`.
///
/// Exercises are deduplicated and the plan is stored before the user is
/// looked up, so a missing user still leaves both behind.
async fn create_workout_plan(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<WorkoutPlanInput>, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<WorkoutPlan>>)> {
    body.validate()?;
    let WorkoutPlanInput {
        name,
        category,
        exercises,
    } = body;

    let name = present(name, "name")?;
    let category = present(category, "category")?;
    let exercises = state
        .relations
        .resolve_exercise_plans(present(exercises, "exercises")?)
        .await?;

    let now = Utc::now();
    let plan = state
        .db
        .insert(&WorkoutPlan {
            id: String::new(),
            name,
            category,
            exercises,
            created_at: now,
            updated_at: now,
        })
        .await?;

    if let Err(e) = state
        .relations
        .link_to_user(&user_id, UserChild::WorkoutPlan(plan.id.clone()))
        .await
    {
        tracing::warn!(
            user_id = %user_id,
            workout_plan_id = %plan.id,
            error = %e,
            "Workout plan stored but not linked to user"
        );
        return Err(e);
    }

    tracing::info!(
        user_id = %user_id,
        workout_plan_id = %plan.id,
        exercises = plan.exercises.len(),
        "Created workout plan"
    );
    Ok(ApiResponse::created(plan))
}

async fn update_workout_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<WorkoutPlanUpdate>, AppError>,
) -> Result<Json<ApiResponse<WorkoutPlan>>> {
    body.validate()?;

    if !state.db.exists::<WorkoutPlan>(&id).await? {
        return Err(AppError::NotFound(PLAN_NOT_FOUND.to_string()));
    }

    let exercises = match body.exercises {
        Some(inputs) => Some(state.relations.resolve_exercise_plans(inputs).await?),
        None => None,
    };

    let patch = WorkoutPlanPatch {
        name: body.name,
        category: body.category,
        exercises,
        updated_at: Utc::now(),
    };

    let plan = state
        .db
        .update::<WorkoutPlan, _>(&id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(PLAN_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::success_with_message(
        plan,
        "Workout plan updated successfully",
    ))
}

/// The id stays in any user's `workoutPlans`; reads skip it.
async fn delete_workout_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .db
        .delete::<WorkoutPlan>(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(PLAN_NOT_FOUND.to_string()))?;

    tracing::info!(workout_plan_id = %id, "Deleted workout plan");
    Ok(ApiResponse::done(None))
}
