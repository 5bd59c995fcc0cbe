// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reference resolution ("population") on read.
//!
//! Reference fields store target document ids. An [`Expand`] lists which
//! relation paths an endpoint wants replaced by the referenced documents,
//! e.g. `schedule.workoutPlans.exercises` on a user walks three hops.
//! Array order is preserved. Dangling references are dropped from arrays
//! and become `null` for single-valued fields.

use super::{collections, DocumentStore, Filter};
use crate::error::AppError;
use futures_util::future::{try_join_all, BoxFuture};
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    One,
    Many,
}

/// A reference field from one collection into another.
struct Relation {
    collection: &'static str,
    field: &'static str,
    target: &'static str,
    arity: Arity,
}

const RELATIONS: &[Relation] = &[
    Relation {
        collection: collections::USERS,
        field: "schedule",
        target: collections::SCHEDULES,
        arity: Arity::One,
    },
    Relation {
        collection: collections::USERS,
        field: "workoutPlans",
        target: collections::WORKOUT_PLANS,
        arity: Arity::Many,
    },
    Relation {
        collection: collections::USERS,
        field: "workoutSessions",
        target: collections::WORKOUT_SESSIONS,
        arity: Arity::Many,
    },
    Relation {
        collection: collections::SCHEDULES,
        field: "workoutPlans",
        target: collections::WORKOUT_PLANS,
        arity: Arity::Many,
    },
    Relation {
        collection: collections::WORKOUT_PLANS,
        field: "exercises",
        target: collections::EXERCISE_PLANS,
        arity: Arity::Many,
    },
    Relation {
        collection: collections::WORKOUT_SESSIONS,
        field: "exercises",
        target: collections::EXERCISE_SESSIONS,
        arity: Arity::Many,
    },
    Relation {
        collection: collections::EXERCISE_SESSIONS,
        field: "sets",
        target: collections::EXERCISE_SETS,
        arity: Arity::Many,
    },
];

fn relation(collection: &str, field: &str) -> Option<&'static Relation> {
    RELATIONS
        .iter()
        .find(|r| r.collection == collection && r.field == field)
}

/// One level of the expansion tree.
#[derive(Debug, Clone, Default, PartialEq)]
struct Node {
    /// Referenced documents must match this to be kept.
    matching: Option<Filter>,
    children: BTreeMap<String, Node>,
}

/// Which reference paths to resolve for a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expand {
    root: Node,
}

impl Expand {
    /// Resolve nothing; reference fields stay as ids.
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolve a dotted relation path such as `workoutPlans.exercises`.
    pub fn path(self, path: &str) -> Self {
        self.insert(path, None)
    }

    /// Resolve a path, keeping only first-hop documents that match `filter`.
    pub fn path_matching(self, path: &str, filter: Filter) -> Self {
        self.insert(path, Some(filter))
    }

    fn insert(mut self, path: &str, matching: Option<Filter>) -> Self {
        let mut node = &mut self.root;
        for (depth, segment) in path.split('.').filter(|s| !s.is_empty()).enumerate() {
            node = node.children.entry(segment.to_string()).or_default();
            if depth == 0 && matching.is_some() {
                node.matching = matching.clone();
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Check every path against the relation table, starting at `collection`.
    pub fn check(&self, collection: &str) -> Result<(), AppError> {
        check_node(collection, &self.root)
    }
}

fn check_node(collection: &str, node: &Node) -> Result<(), AppError> {
    for (field, child) in &node.children {
        let relation = relation(collection, field).ok_or_else(|| unknown(collection, field))?;
        check_node(relation.target, child)?;
    }
    Ok(())
}

fn unknown(collection: &str, field: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "No relation {}.{} to expand",
        collection,
        field
    ))
}

/// Resolve the references of `doc` (a document of `collection`) per `expand`.
pub async fn populate(
    store: &dyn DocumentStore,
    collection: &str,
    doc: Value,
    expand: &Expand,
) -> Result<Value, AppError> {
    if expand.is_empty() {
        return Ok(doc);
    }
    populate_node(store, collection, doc, &expand.root).await
}

fn populate_node<'a>(
    store: &'a dyn DocumentStore,
    collection: &'a str,
    mut doc: Value,
    node: &'a Node,
) -> BoxFuture<'a, Result<Value, AppError>> {
    async move {
        for (field, child) in &node.children {
            let relation = relation(collection, field).ok_or_else(|| unknown(collection, field))?;

            let resolved = match (relation.arity, doc.get(field.as_str())) {
                (Arity::One, Some(Value::String(id))) => {
                    let id = id.clone();
                    resolve(store, relation.target, &id, child).await?
                }
                (Arity::Many, Some(Value::Array(items))) => {
                    let ids: Vec<String> = items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect();
                    let docs = try_join_all(
                        ids.iter()
                            .map(|id| resolve(store, relation.target, id, child)),
                    )
                    .await?;
                    Value::Array(docs.into_iter().filter(|d| !d.is_null()).collect())
                }
                // Absent, null, or already expanded.
                _ => continue,
            };

            if let Some(slot) = doc.get_mut(field.as_str()) {
                *slot = resolved;
            }
        }
        Ok(doc)
    }
    .boxed()
}

/// Fetch one referenced document and expand it further; `null` if absent or filtered out.
async fn resolve(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    node: &Node,
) -> Result<Value, AppError> {
    let Some(doc) = store.get(collection, id).await? else {
        return Ok(Value::Null);
    };

    if let Some(filter) = &node.matching {
        if !filter.matches(&doc) {
            return Ok(Value::Null);
        }
    }

    populate_node(store, collection, doc, node).await
}
