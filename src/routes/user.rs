// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile routes.

use super::ApiResponse;
use crate::db::Filter;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserUpdate};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use std::sync::Arc;

const USER_NOT_FOUND: &str = "User not found";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/user", post(create_user)).route(
        "/user/{id}",
        get(get_user).put(update_user).delete(delete_user),
    )
}

/// Fail if another user already has `email`.
async fn ensure_email_free(state: &AppState, email: &str, except: Option<&str>) -> Result<()> {
    let holders = state
        .db
        .find::<User>(&Filter::new().eq("email", email))
        .await?;

    if holders.iter().any(|u| Some(u.id.as_str()) != except) {
        return Err(AppError::BadRequest(format!(
            "A user with email {} already exists",
            email
        )));
    }
    Ok(())
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state
        .db
        .get::<User>(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::success(user))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<NewUser>, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<User>>)> {
    let user = body.into_user(Utc::now())?;
    ensure_email_free(&state, &user.email, None).await?;

    let user = state.db.insert(&user).await?;
    tracing::info!(user_id = %user.id, "Created user");

    Ok(ApiResponse::created(user))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<UserUpdate>, AppError>,
) -> Result<Json<ApiResponse<User>>> {
    if let Some(email) = &body.email {
        ensure_email_free(&state, email, Some(&id)).await?;
    }

    let user = state
        .db
        .update::<User, _>(&id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::success(user))
}

/// Referenced plans, sessions and schedules are left in place.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .db
        .delete::<User>(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    tracing::info!(user_id = %id, "Deleted user");
    Ok(ApiResponse::done(Some("User successfully deleted")))
}
