//! Typed record layer over a [`RecordStore`].
//!
//! `Collection<R>` is what handlers use instead of raw JSON: it assigns ids,
//! stamps timestamps from the injected clock, validates drafts and patches,
//! and (de)serializes documents.

use crate::environment::Clock;
use crate::error::{StoreError, ValidationError};
use crate::store::{Filter, ListQuery, RecordStore};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// A persisted document type.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (table) name.
    const COLLECTION: &'static str;
    /// Human-readable singular name, used in error messages.
    const NAME: &'static str;

    /// Primary key.
    fn id(&self) -> Uuid;
}

/// A record that clients create and update through drafts and patches.
pub trait Resource: Record {
    /// Create payload.
    type Draft: DeserializeOwned + Send + 'static;
    /// Update payload; every field optional.
    type Patch: DeserializeOwned + Send + 'static;

    /// Build a new record from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the draft breaks a field rule.
    fn from_draft(id: Uuid, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self, ValidationError>;

    /// Apply a patch in place. Callers apply it to a copy, so a failed
    /// patch never reaches the store.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the patched record breaks a field rule.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> Result<(), ValidationError>;
}

/// [`Resource::Patch`] for records that never change once written.
///
/// Uninhabited: every update payload fails to deserialize, so
/// `apply_patch` can never be reached.
#[derive(Debug, Clone, Copy)]
pub enum Immutable {}

impl<'de> Deserialize<'de> for Immutable {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(D::Error::custom("this record cannot be modified"))
    }
}

/// Errors from [`Collection::create`] and [`Collection::update`].
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Payload rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Store rejected or failed the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Typed access to one collection.
pub struct Collection<R> {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Collection<R> {
    /// Create a collection handle.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            _record: PhantomData,
        }
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Insert a fully built record.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the store fails.
    pub async fn insert(&self, record: &R) -> Result<(), StoreError> {
        let data = serde_json::to_value(record)?;
        self.store.insert(R::COLLECTION, record.id(), data).await
    }

    /// Fetch by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the document does not decode.
    pub async fn get(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        self.store
            .fetch(R::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// List records.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or a document does not decode.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<R>, StoreError> {
        self.store
            .list(R::COLLECTION, query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Count records matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn count(&self, filters: &[Filter]) -> Result<u64, StoreError> {
        self.store.count(R::COLLECTION, filters).await
    }

    /// Whether any record matches `filters`.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn exists(&self, filters: &[Filter]) -> Result<bool, StoreError> {
        Ok(self.count(filters).await? > 0)
    }

    /// Overwrite a record. Returns `false` when it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the store fails.
    pub async fn replace(&self, record: &R) -> Result<bool, StoreError> {
        let data = serde_json::to_value(record)?;
        self.store.replace(R::COLLECTION, record.id(), data).await
    }

    /// Delete by id and return the removed record.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or the removed document does not decode.
    pub async fn delete(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        self.store
            .remove(R::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }
}

impl<R: Resource> Collection<R> {
    /// Validate a draft, assign a fresh id, and persist it.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad draft, `Store` when persisting fails.
    pub async fn create(&self, draft: R::Draft) -> Result<R, WriteError> {
        let record = R::from_draft(Uuid::new_v4(), draft, self.clock.now())?;
        self.insert(&record).await?;
        Ok(record)
    }

    /// Apply a patch to an existing record. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad patch, `Store` when loading or saving fails.
    pub async fn update(&self, id: Uuid, patch: R::Patch) -> Result<Option<R>, WriteError> {
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        record.apply_patch(patch, self.clock.now())?;

        if self.replace(&record).await? {
            Ok(Some(record))
        } else {
            // Deleted between the read and the write.
            Ok(None)
        }
    }
}

fn decode<R: Record>(value: serde_json::Value) -> Result<R, StoreError> {
    serde_json::from_value(value).map_err(StoreError::from)
}
