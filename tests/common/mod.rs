// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use fitness_tracker::config::Config;
use fitness_tracker::db::{Db, FirestoreStore};
use fitness_tracker::routes::create_router;
use fitness_tracker::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a store connected to the emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), Db::in_memory()));
    (create_router(state.clone()), state)
}

/// Send one request and decode the JSON response body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, body.map(|b| b.to_string())).await;
    let json = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response to {} {} is not JSON ({}): {}",
            method,
            uri,
            e,
            String::from_utf8_lossy(&bytes)
        )
    });
    (status, json)
}

/// Send one request with a raw body and return the undecoded response body.
#[allow(dead_code)]
pub async fn send_raw(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(text)
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// Create a user through the API and return its id.
#[allow(dead_code)]
pub async fn create_user(app: &axum::Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/user",
        Some(json!({
            "firstName": "Sam",
            "lastName": "Lifter",
            "email": email,
            "bio": "lifts things"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["_id"].as_str().unwrap().to_string()
}

/// A complete exercise plan payload.
#[allow(dead_code)]
pub fn exercise_plan(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Flat barbell press",
        "icon": "https://example.com/bench.png",
        "muscleType": "Chest",
        "sets": 3,
        "reps": 8,
        "weight": 185,
        "restTime": 90,
        "intensity": "high"
    })
}

/// A complete exercise session payload with two sets.
#[allow(dead_code)]
pub fn exercise_session(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Back squat",
        "icon": "https://example.com/squat.png",
        "muscleType": "Legs",
        "category": "Strength",
        "sets": [
            {"setNum": 1, "weight": 225, "duration": 40, "restTime": 120},
            {"setNum": 2, "weight": 245, "duration": 35}
        ]
    })
}

/// Create a workout plan for `user_id` and return its id.
#[allow(dead_code)]
pub async fn create_plan(app: &axum::Router, user_id: &str, name: &str, category: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/workout_plan/{}", user_id),
        Some(json!({
            "name": name,
            "category": category,
            "exercises": [exercise_plan("Bench Press")]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["_id"].as_str().unwrap().to_string()
}
