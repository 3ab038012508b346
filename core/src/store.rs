//! Document store abstraction.
//!
//! Every entity is persisted as a JSON document in its own collection (one
//! table per collection in Postgres). The trait is deliberately small: the
//! platform only ever performs single-record CRUD and equality-filtered lists.
//!
//! # Implementations
//!
//! - `PostgresRecordStore` (in `eventmingle-postgres`): production
//! - `InMemoryRecordStore` (in `eventmingle-testing`): fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! The trait is used as `Arc<dyn RecordStore>` inside application state, so it
//! is declared with `async_trait` rather than native `async fn`.

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Equality condition on a top-level document field.
///
/// Values are compared against the field's text rendering, the way
/// Postgres' `data->>'field'` renders it (strings unquoted, numbers and
/// booleans as their literal text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Top-level field name.
    pub field: String,
    /// Expected text value.
    pub value: String,
}

impl Filter {
    /// Build a filter from anything string-like.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl ToString) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Ordering of list results by insertion time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    NewestFirst,
    /// Oldest first (chat history).
    OldestFirst,
}

/// Parameters for [`RecordStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// All filters must match.
    pub filters: Vec<Filter>,
    /// Maximum number of documents; `None` returns everything.
    pub limit: Option<usize>,
    /// Documents to skip.
    pub offset: usize,
    /// Result ordering.
    pub order: SortOrder,
}

impl ListQuery {
    /// Query with no filters and no limit.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(field, value));
        self
    }

    /// Restrict to one page.
    #[must_use]
    pub const fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Change the ordering.
    #[must_use]
    pub const fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

/// Render a JSON value the way Postgres' `->>` operator does.
///
/// Returns `None` for `null`, matching SQL `NULL` (never equal to anything).
#[must_use]
pub fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Returns `true` when `document` satisfies every filter.
#[must_use]
pub fn matches_filters(document: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        document
            .get(&filter.field)
            .and_then(json_text)
            .is_some_and(|text| text == filter.value)
    })
}

/// Persistence for JSON documents keyed by `(collection, id)`.
///
/// Implementations must reject collection names outside
/// [`KNOWN_COLLECTIONS`](crate::entities::KNOWN_COLLECTIONS) with
/// [`StoreError::UnknownCollection`] and report unique-index violations as
/// [`StoreError::Conflict`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new document.
    ///
    /// # Errors
    ///
    /// `Conflict` when the id or a unique field already exists.
    async fn insert(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError>;

    /// Fetch one document.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    async fn fetch(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// List documents matching `query`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Value>, StoreError>;

    /// Count documents matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError>;

    /// Overwrite an existing document. Returns `false` when it does not exist.
    ///
    /// # Errors
    ///
    /// `Conflict` when the new document violates a unique index.
    async fn replace(&self, collection: &str, id: Uuid, data: Value) -> Result<bool, StoreError>;

    /// Delete a document and return what was stored.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    async fn remove(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
