// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers talk to [`Db`], a typed facade over a [`DocumentStore`]. The
//! store itself only deals in JSON documents, which keeps it object-safe
//! and lets the same relationship logic run against Firestore or the
//! in-memory backend.

pub mod firestore;
pub mod memory;
pub mod populate;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use populate::Expand;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKOUT_PLANS: &str = "workout_plans";
    pub const EXERCISE_PLANS: &str = "exercise_plans";
    pub const SCHEDULES: &str = "schedules";
    pub const WORKOUT_SESSIONS: &str = "workout_sessions";
    pub const EXERCISE_SESSIONS: &str = "exercise_sessions";
    pub const EXERCISE_SETS: &str = "exercise_sets";
}

/// Field holding the document identifier in every stored document.
pub const ID_FIELD: &str = "_id";

/// Conjunctive equality filter: a document matches when every field equals
/// the given value exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    /// Build a filter from every top-level field of a serializable value.
    ///
    /// `None` options are skipped by serde attributes on the key type, not here:
    /// a `null` field becomes an equality condition on `null`.
    pub fn from_fields<T: Serialize>(key: &T) -> Result<Self, AppError> {
        match serde_json::to_value(key)? {
            Value::Object(map) => Ok(Self {
                fields: map.into_iter().collect(),
            }),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "Filter key must serialize to an object, got {}",
                other
            ))),
        }
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Evaluate the filter against a JSON document.
    pub fn matches(&self, doc: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// Generic document store: collections of JSON objects addressed by id.
///
/// Implementations assign identifiers on insert and store them under
/// [`ID_FIELD`]. No operation spans more than one document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// All documents matching the filter, in store order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, AppError>;

    /// Insert a new document and return it with its assigned id.
    async fn insert(&self, collection: &str, doc: Map<String, Value>) -> Result<Value, AppError>;

    /// Overwrite the given top-level fields of a document.
    ///
    /// Returns the updated document, or `None` if no document has that id.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, AppError>;

    /// Remove a document, returning what was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Remove every occurrence of `value` from the array `field` of one document.
    ///
    /// Returns the number of documents modified (0 or 1). A missing document
    /// and an array that never held the value both report 0.
    async fn pull(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError>;

    /// Append `value` to the array `field` of one document unless it is
    /// already there, creating the array if needed.
    ///
    /// The append is applied atomically by the store, so concurrent pushes
    /// to the same document are all kept. Returns the number of documents
    /// matched (0 or 1).
    async fn push(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError>;
}

/// A record type persisted in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    /// Store-assigned identifier; empty until inserted.
    fn id(&self) -> &str;
}

/// Typed database client shared by all handlers.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn DocumentStore>,
}

impl Db {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Database backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub async fn get<T: Entity>(&self, id: &str) -> Result<Option<T>, AppError> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Like [`Db::get`], but only checks existence.
    pub async fn exists<T: Entity>(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.store.get(T::COLLECTION, id).await?.is_some())
    }

    pub async fn find<T: Entity>(&self, filter: &Filter) -> Result<Vec<T>, AppError> {
        self.store
            .find(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// First document matching the filter.
    pub async fn find_one<T: Entity>(&self, filter: &Filter) -> Result<Option<T>, AppError> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    /// Insert a record; any id already present on it is replaced by the store.
    pub async fn insert<T: Entity>(&self, record: &T) -> Result<T, AppError> {
        let mut doc = encode(record)?;
        doc.remove(ID_FIELD);
        decode(self.store.insert(T::COLLECTION, doc).await?)
    }

    /// Write the given fields onto an existing record.
    pub async fn update<T: Entity, U: Serialize>(
        &self,
        id: &str,
        fields: &U,
    ) -> Result<Option<T>, AppError> {
        let mut doc = encode(fields)?;
        doc.remove(ID_FIELD);
        self.store
            .update(T::COLLECTION, id, doc)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn delete<T: Entity>(&self, id: &str) -> Result<Option<T>, AppError> {
        self.store
            .delete(T::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Remove `value` from an array field; returns the modified count.
    pub async fn pull<T: Entity>(
        &self,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError> {
        self.store.pull(T::COLLECTION, id, field, value).await
    }

    /// Append `value` to an array field; returns the matched count.
    pub async fn push<T: Entity>(
        &self,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError> {
        self.store.push(T::COLLECTION, id, field, value).await
    }

    /// Fetch a document and resolve its references per `expand`.
    pub async fn get_expanded<T: Entity>(
        &self,
        id: &str,
        expand: &Expand,
    ) -> Result<Option<Value>, AppError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(
                populate::populate(self.store(), T::COLLECTION, doc, expand).await?,
            )),
            None => Ok(None),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(anyhow::anyhow!(
            "Document must serialize to an object, got {}",
            other
        ))),
    }
}

fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(doc)?)
}
