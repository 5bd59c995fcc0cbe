// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed document store.
//!
//! Every entity lives in its own top-level collection. Document IDs are
//! UUIDs assigned here and mirrored into the `_id` field so documents read
//! back identically from either backend.

use super::{DocumentStore, Filter, ID_FIELD};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};

// Commits that lose a race with another writer are retried this many times.
const TRANSACTION_ATTEMPTS: u32 = 5;

/// Firestore document store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator rejects real credentials lookups, so use an unauthenticated connection.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Read one document, let `apply` change it, and write it back inside a
    /// transaction.
    ///
    /// The read is bound to the transaction, so a concurrent writer makes the
    /// commit fail and the whole step is retried on fresh data. `apply`
    /// returns false to leave the document untouched. Returns the document
    /// as read or written, with whether it was written, or `None` if it
    /// does not exist.
    async fn modify<F>(
        &self,
        collection: &str,
        id: &str,
        mut apply: F,
    ) -> Result<Option<(Value, bool)>, AppError>
    where
        F: FnMut(&mut Value) -> bool + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let reader = self.client.clone_with_consistency_selector(
                firestore::FirestoreConsistencySelector::Transaction(
                    transaction.transaction_id().clone(),
                ),
            );
            let read: Result<Option<Value>, _> = reader
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await;

            let mut doc = match read {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    let _ = transaction.rollback().await;
                    return Ok(None);
                }
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::Database(format!(
                        "Failed to read {} in transaction: {}",
                        collection, e
                    )));
                }
            };

            if !apply(&mut doc) {
                let _ = transaction.rollback().await;
                return Ok(Some((doc, false)));
            }

            self.client
                .fluent()
                .update()
                .in_col(collection)
                .document_id(id)
                .object(&doc)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add write to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(Some((doc, true))),
                Err(e) if attempt < TRANSACTION_ATTEMPTS => {
                    tracing::warn!(
                        collection,
                        id,
                        attempt,
                        error = %e,
                        "Transaction commit failed, retrying"
                    );
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Failed to commit transaction: {}",
                        e
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, AppError> {
        let query = self.client.fluent().select().from(collection);

        let query = if filter.is_empty() {
            query
        } else {
            let conditions = filter.fields().to_vec();
            query.filter(move |q| {
                q.for_all(
                    conditions
                        .iter()
                        .map(|(field, value)| q.field(field.as_str()).eq(value.clone())),
                )
            })
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(
        &self,
        collection: &str,
        mut doc: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let doc = Value::Object(doc);

        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collection)
            .document_id(&id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(collection, id = %id, "Inserted document");
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let merged = self
            .modify(collection, id, |doc| {
                if let Some(map) = doc.as_object_mut() {
                    for (field, value) in &fields {
                        if field != ID_FIELD {
                            map.insert(field.clone(), value.clone());
                        }
                    }
                }
                true
            })
            .await?;

        Ok(merged.map(|(doc, _)| doc))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        let Some(doc) = self.get(collection, id).await? else {
            return Ok(None);
        };

        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(doc))
    }

    async fn pull(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError> {
        let pulled = self
            .modify(collection, id, |doc| {
                let Some(array) = doc.get_mut(field).and_then(Value::as_array_mut) else {
                    return false;
                };
                let before = array.len();
                array.retain(|item| item.as_str() != Some(value));
                array.len() < before
            })
            .await?;

        Ok(match pulled {
            Some((_, true)) => 1,
            _ => 0,
        })
    }

    async fn push(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError> {
        let pushed = self
            .modify(collection, id, |doc| {
                let Some(map) = doc.as_object_mut() else {
                    return false;
                };
                let slot = map
                    .entry(field.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !slot.is_array() {
                    *slot = Value::Array(Vec::new());
                }
                let Value::Array(array) = slot else {
                    return false;
                };
                if array.iter().any(|item| item.as_str() == Some(value)) {
                    return false;
                }
                array.push(Value::String(value.to_string()));
                true
            })
            .await?;

        Ok(if pushed.is_some() { 1 } else { 0 })
    }
}
