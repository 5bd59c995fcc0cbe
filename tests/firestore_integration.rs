// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and
//! FIRESTORE_EMULATOR_HOST to point at it. They are skipped otherwise.
//!
//! Every test writes uniquely named documents, so the emulator does not
//! need to be reset between runs.

use fitness_tracker::db::{Db, DocumentStore, Expand, Filter};
use fitness_tracker::models::{ExercisePlan, Intensity, User};
use fitness_tracker::services::{RelationshipManager, UserChild};
use serde_json::json;
use std::sync::Arc;

mod common;
use common::test_firestore;

/// Unique suffix for test isolation.
fn unique() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn test_user(email: &str) -> User {
    User {
        id: String::new(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        full_name: "Test User".to_string(),
        email: email.to_string(),
        date: chrono::Utc::now(),
        bio: None,
        picture: None,
        schedule: None,
        workout_plans: vec![],
        workout_sessions: vec![],
    }
}

fn exercise(name: &str) -> ExercisePlan {
    ExercisePlan {
        id: String::new(),
        name: name.to_string(),
        description: "Flat barbell press".to_string(),
        icon: "bench.png".to_string(),
        muscle_type: "Chest".to_string(),
        sets: 3,
        reps: 8,
        weight: 185.0,
        rest_time: 90,
        intensity: Intensity::High,
    }
}

async fn test_db() -> Db {
    Db::new(Arc::new(test_firestore().await))
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_insert_get_update_delete() {
    require_emulator!();
    let store = test_firestore().await;

    let doc = json!({"name": format!("doc-{}", unique()), "count": 1});
    let serde_json::Value::Object(map) = doc else {
        unreachable!()
    };
    let inserted = store.insert("store_tests", map).await.unwrap();
    let id = inserted["_id"].as_str().unwrap().to_string();

    let fetched = store.get("store_tests", &id).await.unwrap().unwrap();
    assert_eq!(fetched["count"], 1);

    let mut fields = serde_json::Map::new();
    fields.insert("count".to_string(), json!(2));
    let updated = store
        .update("store_tests", &id, fields)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated["count"], 2);
    assert_eq!(updated["name"], fetched["name"]);

    assert!(store.delete("store_tests", &id).await.unwrap().is_some());
    assert!(store.get("store_tests", &id).await.unwrap().is_none());
    assert!(store.delete("store_tests", &id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_matches_every_field() {
    require_emulator!();
    let db = test_db().await;
    let email = format!("{}@example.com", unique());

    let user = db.insert(&test_user(&email)).await.unwrap();

    let hits = db
        .find::<User>(&Filter::new().eq("email", email.as_str()).eq("firstName", "Test"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, user.id);

    let misses = db
        .find::<User>(&Filter::new().eq("email", email.as_str()).eq("firstName", "Other"))
        .await
        .unwrap();
    assert!(misses.is_empty());
}

#[tokio::test]
async fn test_pull_reports_modified_count() {
    require_emulator!();
    let db = test_db().await;
    let mut user = test_user(&format!("{}@example.com", unique()));
    user.workout_sessions = vec!["a".to_string(), "b".to_string()];
    let user = db.insert(&user).await.unwrap();

    assert_eq!(db.pull::<User>(&user.id, "workoutSessions", "a").await.unwrap(), 1);
    assert_eq!(db.pull::<User>(&user.id, "workoutSessions", "a").await.unwrap(), 0);
    assert_eq!(db.pull::<User>("missing", "workoutSessions", "b").await.unwrap(), 0);

    let user = db.get::<User>(&user.id).await.unwrap().unwrap();
    assert_eq!(user.workout_sessions, vec!["b"]);
}

#[tokio::test]
async fn test_concurrent_pushes_are_all_kept() {
    require_emulator!();
    let db = test_db().await;
    let user = db
        .insert(&test_user(&format!("{}@example.com", unique())))
        .await
        .unwrap();

    let pushes = (0..8).map(|n| {
        let db = db.clone();
        let id = user.id.clone();
        async move {
            db.push::<User>(&id, "workoutPlans", &format!("p{}", n))
                .await
        }
    });
    let matched = futures_util::future::try_join_all(pushes).await.unwrap();
    assert!(matched.iter().all(|&m| m == 1));
    assert_eq!(db.push::<User>("missing", "workoutPlans", "p").await.unwrap(), 0);

    let user = db.get::<User>(&user.id).await.unwrap().unwrap();
    assert_eq!(user.workout_plans.len(), 8);
}

// ═══════════════════════════════════════════════════════════════════════════
// RELATIONSHIP TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_dedup_against_firestore() {
    require_emulator!();
    let db = test_db().await;
    let manager = RelationshipManager::new(db.clone());
    let name = format!("Bench {}", unique());

    let first = manager.dedup_or_insert(&[exercise(&name)]).await.unwrap();
    let mut more_reps = exercise(&name);
    more_reps.reps = 12;
    let second = manager.dedup_or_insert(&[more_reps]).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_link_and_populate() {
    require_emulator!();
    let db = test_db().await;
    let manager = RelationshipManager::new(db.clone());
    let user = db
        .insert(&test_user(&format!("{}@example.com", unique())))
        .await
        .unwrap();

    let exercises = manager
        .dedup_or_insert(&[exercise(&format!("Press {}", unique()))])
        .await
        .unwrap();
    let now = chrono::Utc::now();
    let plan = db
        .insert(&fitness_tracker::models::WorkoutPlan {
            id: String::new(),
            name: "Push1".to_string(),
            category: "Push".to_string(),
            exercises: exercises.clone(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    manager
        .link_to_user(&user.id, UserChild::WorkoutPlan(plan.id.clone()))
        .await
        .unwrap();

    let expanded = db
        .get_expanded::<User>(&user.id, &Expand::none().path("workoutPlans.exercises"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(expanded["workoutPlans"][0]["_id"], plan.id.as_str());
    assert_eq!(
        expanded["workoutPlans"][0]["exercises"][0]["_id"],
        exercises[0].as_str()
    );
}
