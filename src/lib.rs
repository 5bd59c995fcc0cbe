// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness-Tracker: workout planning and logging backend
//!
//! This crate provides a JSON REST API over users, workout plans,
//! schedules and recorded workout sessions, kept in a document store.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::RelationshipManager;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub relations: RelationshipManager,
}

impl AppState {
    pub fn new(config: Config, db: Db) -> Self {
        Self {
            config,
            relations: RelationshipManager::new(db.clone()),
            db,
        }
    }
}
