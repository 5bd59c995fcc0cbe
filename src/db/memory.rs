// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Used for local development (`STORE_BACKEND=memory`) and by the test
//! suite. Each collection keeps insertion order so `find` returns the
//! oldest match first.

use super::{DocumentStore, Filter, ID_FIELD};
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

/// Document store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn has_id(doc: &Value, id: &str) -> bool {
    doc.get(ID_FIELD).and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, id)).cloned()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        collection: &str,
        mut doc: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(id));
        let doc = Value::Object(doc);

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());

        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(doc) = docs.iter_mut().find(|doc| has_id(doc, id)) else {
            return Ok(None);
        };

        if let Some(map) = doc.as_object_mut() {
            for (field, value) in fields {
                if field != ID_FIELD {
                    map.insert(field, value);
                }
            }
        }

        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(None);
        };

        let index = docs.iter().position(|doc| has_id(doc, id));
        Ok(index.map(|index| docs.remove(index)))
    }

    async fn pull(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(array) = docs
            .iter_mut()
            .find(|doc| has_id(doc, id))
            .and_then(|doc| doc.get_mut(field))
            .and_then(Value::as_array_mut)
        else {
            return Ok(0);
        };

        let before = array.len();
        array.retain(|item| item.as_str() != Some(value));

        Ok(if array.len() < before { 1 } else { 0 })
    }

    async fn push(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<u64, AppError> {
        // The shard lock is held across lookup and append.
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(map) = docs
            .iter_mut()
            .find(|doc| has_id(doc, id))
            .and_then(Value::as_object_mut)
        else {
            return Ok(0);
        };

        let slot = map
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(array) = slot {
            if !array.iter().any(|item| item.as_str() == Some(value)) {
                array.push(Value::String(value.to_string()));
            }
        }

        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_distinct_ids() {
        let store = MemoryStore::new();

        let a = store
            .insert("sets", object(json!({"setNum": 1})))
            .await
            .unwrap();
        let b = store
            .insert("sets", object(json!({"setNum": 1})))
            .await
            .unwrap();

        assert_ne!(a[ID_FIELD], b[ID_FIELD]);
        assert_eq!(store.count("sets"), 2);
    }

    #[tokio::test]
    async fn test_find_returns_oldest_match_first() {
        let store = MemoryStore::new();
        let first = store
            .insert("plans", object(json!({"category": "Push", "name": "A"})))
            .await
            .unwrap();
        store
            .insert("plans", object(json!({"category": "Pull", "name": "B"})))
            .await
            .unwrap();
        store
            .insert("plans", object(json!({"category": "Push", "name": "C"})))
            .await
            .unwrap();

        let found = store
            .find("plans", &Filter::new().eq("category", "Push"))
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0], first);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let doc = store
            .insert("users", object(json!({"bio": "old", "email": "a@b.c"})))
            .await
            .unwrap();
        let id = doc[ID_FIELD].as_str().unwrap();

        let updated = store
            .update("users", id, object(json!({"bio": "new", "_id": "hijack"})))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated["bio"], "new");
        assert_eq!(updated["email"], "a@b.c");
        assert_eq!(updated[ID_FIELD], id);

        let missing = store
            .update("users", "nope", object(json!({"bio": "x"})))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_document() {
        let store = MemoryStore::new();
        let doc = store
            .insert("users", object(json!({"email": "a@b.c"})))
            .await
            .unwrap();
        let id = doc[ID_FIELD].as_str().unwrap();

        assert_eq!(store.delete("users", id).await.unwrap(), Some(doc.clone()));
        assert!(store.delete("users", id).await.unwrap().is_none());
        assert!(store.get("users", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pull_reports_modified_count() {
        let store = MemoryStore::new();
        let doc = store
            .insert("users", object(json!({"workoutSessions": ["s1", "s2"]})))
            .await
            .unwrap();
        let id = doc[ID_FIELD].as_str().unwrap();

        assert_eq!(store.pull("users", id, "workoutSessions", "s1").await.unwrap(), 1);
        assert_eq!(store.pull("users", id, "workoutSessions", "s1").await.unwrap(), 0);
        assert_eq!(store.pull("users", "ghost", "workoutSessions", "s2").await.unwrap(), 0);

        let user = store.get("users", id).await.unwrap().unwrap();
        assert_eq!(user["workoutSessions"], json!(["s2"]));
    }

    #[tokio::test]
    async fn test_push_appends_once_and_creates_array() {
        let store = MemoryStore::new();
        let doc = store
            .insert("users", object(json!({"workoutPlans": ["p1"]})))
            .await
            .unwrap();
        let id = doc[ID_FIELD].as_str().unwrap();

        assert_eq!(store.push("users", id, "workoutPlans", "p2").await.unwrap(), 1);
        assert_eq!(store.push("users", id, "workoutPlans", "p2").await.unwrap(), 1);
        assert_eq!(store.push("users", id, "workoutSessions", "s1").await.unwrap(), 1);
        assert_eq!(store.push("users", "ghost", "workoutPlans", "p3").await.unwrap(), 0);

        let user = store.get("users", id).await.unwrap().unwrap();
        assert_eq!(user["workoutPlans"], json!(["p1", "p2"]));
        assert_eq!(user["workoutSessions"], json!(["s1"]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_are_all_kept() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let doc = store
            .insert("users", object(json!({"workoutPlans": []})))
            .await
            .unwrap();
        let id = doc[ID_FIELD].as_str().unwrap().to_string();

        let tasks: Vec<_> = (0..64)
            .map(|n| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    store
                        .push("users", &id, "workoutPlans", &format!("p{n}"))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), 1);
        }

        let user = store.get("users", &id).await.unwrap().unwrap();
        assert_eq!(user["workoutPlans"].as_array().unwrap().len(), 64);
    }
}
