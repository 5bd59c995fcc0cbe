// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Relationship management between parent documents and their children.
//!
//! Handles the write-side workflow shared by plans, sessions and schedules:
//! 1. Resolve embedded children to ids (reusing matching documents)
//! 2. Persist the parent with those ids (done by the caller)
//! 3. Record the parent on its owning user
//!
//! Appends to reference arrays are single atomic store operations, so
//! concurrent requests for one user never lose each other's ids. The steps
//! as a whole are not transactional: a failure after step 1 leaves the
//! children in place, and the dedup lookup races with concurrent inserts of
//! the same child (both requests can miss and insert).

use crate::db::{Db, Entity, Filter};
use crate::error::{AppError, Result};
use crate::models::user::ScheduleLink;
use crate::models::{
    ExercisePlan, ExercisePlanInput, ExerciseSession, ExerciseSessionInput, ExerciseSet,
    ExerciseSetInput, User,
};

/// Child documents that are shared when their comparable fields match.
pub trait Deduplicated: Entity {
    fn comparable_filter(&self) -> Result<Filter>;
}

impl Deduplicated for ExercisePlan {
    fn comparable_filter(&self) -> Result<Filter> {
        ExercisePlan::comparable_filter(self)
    }
}

impl Deduplicated for ExerciseSession {
    fn comparable_filter(&self) -> Result<Filter> {
        ExerciseSession::comparable_filter(self)
    }
}

/// A child document owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChild {
    WorkoutPlan(String),
    WorkoutSession(String),
    /// Replaces any previous schedule reference.
    Schedule(String),
}

/// Outcome of a dedup lookup.
#[derive(Debug)]
pub struct Resolved<T> {
    pub record: T,
    /// False when an existing document was reused
    pub inserted: bool,
}

/// Maintains references between users, plans, sessions and their children.
#[derive(Clone)]
pub struct RelationshipManager {
    db: Db,
}

impl RelationshipManager {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Reuse the first document matching `child`'s comparable fields, or insert it.
    pub async fn find_or_insert<T: Deduplicated>(&self, child: &T) -> Result<Resolved<T>> {
        let filter = child.comparable_filter()?;

        if let Some(existing) = self.db.find_one::<T>(&filter).await? {
            tracing::debug!(
                collection = T::COLLECTION,
                id = existing.id(),
                "Reusing existing child"
            );
            return Ok(Resolved {
                record: existing,
                inserted: false,
            });
        }

        let record = self.db.insert(child).await?;
        tracing::debug!(
            collection = T::COLLECTION,
            id = record.id(),
            "Inserted new child"
        );
        Ok(Resolved {
            record,
            inserted: true,
        })
    }

    /// Resolve each child to an id, in input order.
    pub async fn dedup_or_insert<T: Deduplicated>(&self, children: &[T]) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            let resolved = self.find_or_insert(child).await?;
            ids.push(resolved.record.id().to_string());
        }
        Ok(ids)
    }

    /// Insert every child as a new document, in input order.
    pub async fn insert_all<T: Entity>(&self, children: &[T]) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            ids.push(self.db.insert(child).await?.id().to_string());
        }
        Ok(ids)
    }

    /// Exercise plans of a workout plan request, deduplicated.
    ///
    /// Every payload is checked before anything is written, but an insert
    /// failure part way through still leaves earlier exercises behind.
    pub async fn resolve_exercise_plans(
        &self,
        inputs: Vec<ExercisePlanInput>,
    ) -> Result<Vec<String>> {
        let records = inputs
            .into_iter()
            .map(ExercisePlanInput::into_record)
            .collect::<Result<Vec<_>>>()?;
        self.dedup_or_insert(&records).await
    }

    /// Exercises of a workout session request.
    ///
    /// Sets are always inserted fresh. The exercise itself is deduplicated;
    /// when an existing exercise is reused, the new sets are appended to it.
    pub async fn resolve_exercise_sessions(
        &self,
        inputs: Vec<ExerciseSessionInput>,
    ) -> Result<Vec<String>> {
        let parts = inputs
            .into_iter()
            .map(|input| -> Result<(ExerciseSession, Vec<ExerciseSet>)> {
                let (exercise, sets) = input.into_parts()?;
                let sets = sets
                    .into_iter()
                    .map(ExerciseSetInput::into_record)
                    .collect::<Result<Vec<ExerciseSet>>>()?;
                Ok((exercise, sets))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut ids = Vec::with_capacity(parts.len());
        for (mut exercise, sets) in parts {
            let set_ids = self.insert_all(&sets).await?;
            exercise.sets = set_ids.clone();

            let resolved = self.find_or_insert(&exercise).await?;
            let id = resolved.record.id.clone();

            if !resolved.inserted {
                for set_id in &set_ids {
                    if self.db.push::<ExerciseSession>(&id, "sets", set_id).await? == 0 {
                        return Err(AppError::NotFound(format!(
                            "Exercise session {} not found",
                            id
                        )));
                    }
                }
            }

            ids.push(id);
        }
        Ok(ids)
    }

    /// Ids in `ids` that do not name an existing document of `T`.
    pub async fn missing<T: Entity>(&self, ids: &[String]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for id in ids {
            if !self.db.exists::<T>(id).await? {
                missing.push(id.clone());
            }
        }
        Ok(missing)
    }

    /// Record `child` on the user's reference fields.
    ///
    /// A missing user is reported as not found; the child is left as is.
    pub async fn link_to_user(&self, user_id: &str, child: UserChild) -> Result<()> {
        let matched = match &child {
            UserChild::WorkoutPlan(id) => {
                self.db.push::<User>(user_id, "workoutPlans", id).await?
            }
            UserChild::WorkoutSession(id) => {
                self.db.push::<User>(user_id, "workoutSessions", id).await?
            }
            UserChild::Schedule(id) => self
                .db
                .update::<User, _>(user_id, &ScheduleLink { schedule: id })
                .await?
                .map_or(0, |_| 1),
        };

        if matched == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id, child = ?child, "Linked child to user");
        Ok(())
    }

    /// Remove a workout session from the user's session list.
    ///
    /// Fails with not found when nothing changed, which covers both an
    /// unknown user and a session that user never held.
    pub async fn unlink_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        let modified = self
            .db
            .pull::<User>(user_id, "workoutSessions", session_id)
            .await?;

        if modified == 0 {
            return Err(AppError::NotFound(
                "User not found or workout session not associated with user".to_string(),
            ));
        }

        tracing::info!(user_id, session_id, "Unlinked workout session from user");
        Ok(())
    }
}
