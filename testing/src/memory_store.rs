//! In-memory [`RecordStore`].
//!
//! Mirrors `PostgresRecordStore` closely enough for handler tests: unknown
//! collections are rejected, unique indexes from
//! [`UNIQUE_INDEXES`](eventmingle_core::entities::UNIQUE_INDEXES) are enforced,
//! and lists come back newest first unless asked otherwise.

use async_trait::async_trait;
use eventmingle_core::entities::{UNIQUE_INDEXES, is_known_collection};
use eventmingle_core::store::{json_text, matches_filters};
use eventmingle_core::{Filter, ListQuery, RecordStore, SortOrder, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Documents of one collection in insertion order.
type Rows = Vec<(Uuid, Value)>;

/// `HashMap`-backed document store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    collections: RwLock<HashMap<String, Rows>>,
    unavailable: AtomicBool,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a database outage: every call fails with
    /// [`StoreError::Database`] until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Whether a collection holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    fn check(&self, collection: &str) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("connection refused".to_string()));
        }
        if !is_known_collection(collection) {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }
        Ok(())
    }
}

fn unique_key(document: &Value, fields: &[&str]) -> Option<Vec<String>> {
    fields
        .iter()
        .map(|field| document.get(*field).and_then(json_text))
        .collect()
}

/// Reject `document` if another row already holds one of its unique keys.
fn check_unique(collection: &str, rows: &Rows, id: Uuid, document: &Value) -> Result<(), StoreError> {
    for (indexed, fields) in UNIQUE_INDEXES {
        if *indexed != collection {
            continue;
        }
        let Some(key) = unique_key(document, fields) else {
            // NULLs never collide, same as Postgres.
            continue;
        };
        let clash = rows
            .iter()
            .any(|(other, data)| *other != id && unique_key(data, fields).as_ref() == Some(&key));
        if clash {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                detail: format!("duplicate value for ({})", fields.join(", ")),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        self.check(collection)?;
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();

        if rows.iter().any(|(existing, _)| *existing == id) {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                detail: format!("duplicate id {id}"),
            });
        }
        check_unique(collection, rows, id, &data)?;
        rows.push((id, data));
        Ok(())
    }

    async fn fetch(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        self.check(collection)?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|rows| {
            rows.iter()
                .find(|(existing, _)| *existing == id)
                .map(|(_, data)| data.clone())
        }))
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Value>, StoreError> {
        self.check(collection)?;
        let collections = self.collections.read().await;
        let Some(rows) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let matching = rows
            .iter()
            .filter(|(_, data)| matches_filters(data, &query.filters))
            .map(|(_, data)| data.clone());
        let ordered: Vec<Value> = match query.order {
            SortOrder::NewestFirst => matching.rev().collect(),
            SortOrder::OldestFirst => matching.collect(),
        };

        Ok(ordered
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        self.check(collection)?;
        let collections = self.collections.read().await;
        let count = collections.get(collection).map_or(0, |rows| {
            rows.iter()
                .filter(|(_, data)| matches_filters(data, filters))
                .count()
        });
        Ok(count as u64)
    }

    async fn replace(&self, collection: &str, id: Uuid, data: Value) -> Result<bool, StoreError> {
        self.check(collection)?;
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(collection) else {
            return Ok(false);
        };
        check_unique(collection, rows, id, &data)?;

        match rows.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, stored)) => {
                *stored = data;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        self.check(collection)?;
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let position = rows.iter().position(|(existing, _)| *existing == id);
        Ok(position.map(|index| rows.remove(index).1))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}
