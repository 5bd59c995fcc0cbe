// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod schedule;
pub mod user;
pub mod workout_plan;
pub mod workout_session;

use crate::AppState;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Success envelope shared by every endpoint.
///
/// Errors use the same shape with `status: "error"`, see
/// [`crate::error::AppError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            status: "success",
            data: Some(data),
            message: None,
        })
    }

    pub fn success_with_message(data: T, message: &str) -> Json<Self> {
        Json(Self {
            status: "success",
            data: Some(data),
            message: Some(message.to_string()),
        })
    }

    /// 201 response for a newly created document.
    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::success(data))
    }
}

impl ApiResponse<()> {
    /// Success without a payload, as returned by deletes.
    pub fn done(message: Option<&str>) -> Json<Self> {
        Json(Self {
            status: "success",
            data: None,
            message: message.map(str::to_string),
        })
    }
}

/// Take one field out of a populated document, `null` if absent.
pub(crate) fn take_field(mut doc: Value, field: &str) -> Value {
    doc.get_mut(field).map(Value::take).unwrap_or(Value::Null)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

async fn root() -> &'static str {
    "Server up!"
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin {
        None | Some("*") => AllowOrigin::any(),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!(
                    origin,
                    error = %e,
                    "Invalid CORS_ORIGIN, rejecting cross-origin requests"
                );
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        },
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    let api_routes = Router::new()
        .merge(user::routes())
        .merge(workout_plan::routes())
        .merge(workout_session::routes())
        .merge(schedule::routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_omits_absent_parts() {
        let Json(body) = ApiResponse::done(None);
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"status": "success"}));

        let Json(body) = ApiResponse::success_with_message(json!({"_id": "a"}), "updated");
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"status": "success", "data": {"_id": "a"}, "message": "updated"})
        );
    }

    #[test]
    fn test_take_field() {
        let doc = json!({"workoutPlans": [{"_id": "p"}], "email": "x"});
        assert_eq!(take_field(doc.clone(), "workoutPlans"), json!([{"_id": "p"}]));
        assert_eq!(take_field(doc, "schedule"), Value::Null);
    }
}
