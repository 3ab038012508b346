//! `PostgreSQL` record store for EventMingle.
//!
//! Every collection is a table of JSONB documents:
//!
//! ```sql
//! CREATE TABLE events (
//!     id UUID PRIMARY KEY,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```
//!
//! Unique rules (user email, one RSVP per event and user) are expression
//! indexes on the document; violations surface as [`StoreError::Conflict`].
//! Table names are only ever taken from
//! [`KNOWN_COLLECTIONS`](eventmingle_core::entities::KNOWN_COLLECTIONS);
//! filter fields and values are bound parameters.
//!
//! # Example
//!
//! ```ignore
//! use eventmingle_postgres::{DatabaseSettings, PostgresRecordStore};
//!
//! let store = PostgresRecordStore::connect(&DatabaseSettings::new(url)).await?;
//! store.migrate().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use eventmingle_core::entities::KNOWN_COLLECTIONS;
use eventmingle_core::{Filter, ListQuery, RecordStore, SortOrder, StoreError};
use serde_json::Value;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// `postgres://` connection URL.
    pub url: String,
    /// Pool upper bound.
    pub max_connections: u32,
    /// Connections kept open when idle.
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
    /// Idle connections older than this are closed.
    pub idle_timeout: Duration,
}

impl DatabaseSettings {
    /// Settings for `url` with the default pool sizes.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// `RecordStore` backed by a `PgPool`.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(settings.idle_timeout)
            .connect(&settings.url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;

        tracing::info!(
            max_connections = settings.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the collection tables and indexes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Resolve a collection to its table name. Only schema names reach SQL.
fn table(collection: &str) -> Result<&'static str, StoreError> {
    KNOWN_COLLECTIONS
        .iter()
        .copied()
        .find(|known| *known == collection)
        .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
}

/// `WHERE` clause for `filters`, with placeholders numbered from `first`.
///
/// Each filter takes two parameters: the field name and the expected text.
fn where_clause(filters: &[Filter], first: usize) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let conditions: Vec<String> = (0..filters.len())
        .map(|i| {
            let n = first + i * 2;
            format!("data->>${n} = ${}", n + 1)
        })
        .collect();
    format!(" WHERE {}", conditions.join(" AND "))
}

const fn order_clause(order: SortOrder) -> &'static str {
    match order {
        SortOrder::NewestFirst => " ORDER BY created_at DESC, id DESC",
        SortOrder::OldestFirst => " ORDER BY created_at ASC, id ASC",
    }
}

fn store_error(collection: &str, operation: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict {
                collection: collection.to_string(),
                detail: db_err.message().to_string(),
            };
        }
    }
    tracing::error!(collection, operation, error = %err, "Store query failed");
    metrics::counter!("eventmingle_store_errors_total", "operation" => operation).increment(1);
    StoreError::Database(err.to_string())
}

/// `LIMIT`/`OFFSET` binding. Values past `i64::MAX` clamp instead of wrapping.
fn as_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert(&self, collection: &str, id: Uuid, data: Value) -> Result<(), StoreError> {
        let sql = format!("INSERT INTO {} (id, data) VALUES ($1, $2)", table(collection)?);
        sqlx::query(&sql)
            .bind(id)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error(collection, "insert", e))?;
        Ok(())
    }

    async fn fetch(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let sql = format!("SELECT data FROM {} WHERE id = $1", table(collection)?);
        let row: Option<(sqlx::types::JsonValue,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error(collection, "fetch", e))?;
        Ok(row.map(|(data,)| data))
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Value>, StoreError> {
        let params = query.filters.len() * 2;
        let sql = format!(
            "SELECT data FROM {}{}{} LIMIT ${} OFFSET ${}",
            table(collection)?,
            where_clause(&query.filters, 1),
            order_clause(query.order),
            params + 1,
            params + 2,
        );

        let mut statement = sqlx::query_as::<_, (sqlx::types::JsonValue,)>(&sql);
        for filter in &query.filters {
            statement = statement.bind(&filter.field).bind(&filter.value);
        }
        // LIMIT NULL means no limit.
        let rows = statement
            .bind(query.limit.map(as_i64))
            .bind(as_i64(query.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error(collection, "list", e))?;

        Ok(rows.into_iter().map(|(data,)| data).collect())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            table(collection)?,
            where_clause(filters, 1)
        );
        let mut statement = sqlx::query_as::<_, (i64,)>(&sql);
        for filter in filters {
            statement = statement.bind(&filter.field).bind(&filter.value);
        }
        let (count,) = statement
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error(collection, "count", e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn replace(&self, collection: &str, id: Uuid, data: Value) -> Result<bool, StoreError> {
        let sql = format!(
            "UPDATE {} SET data = $2, updated_at = now() WHERE id = $1",
            table(collection)?
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error(collection, "replace", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING data", table(collection)?);
        let row: Option<(sqlx::types::JsonValue,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error(collection, "remove", e))?;
        Ok(row.map(|(data,)| data))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_table_accepts_only_schema_names() {
        assert_eq!(table("events").ok(), Some("events"));
        assert!(matches!(
            table("events; DROP TABLE users"),
            Err(StoreError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_where_clause_numbers_parameters_in_pairs() {
        assert_eq!(where_clause(&[], 1), "");
        let filters = [Filter::eq("event_id", "e1"), Filter::eq("user_id", "u1")];
        assert_eq!(
            where_clause(&filters, 1),
            " WHERE data->>$1 = $2 AND data->>$3 = $4"
        );
    }

    #[test]
    fn test_offsets_clamp_instead_of_wrapping() {
        assert_eq!(as_i64(40), 40);
        assert_eq!(as_i64(usize::MAX), i64::MAX);
    }

    #[test]
    fn test_migration_creates_a_table_per_collection() {
        let migration = MIGRATOR.iter().next().expect("embedded migration");
        assert_eq!(migration.description, "collections");
        for collection in KNOWN_COLLECTIONS {
            let create = format!("CREATE TABLE IF NOT EXISTS {collection} (");
            assert!(migration.sql.contains(&create), "no table for {collection}");
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = DatabaseSettings::new("postgres://localhost/eventmingle");
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(5));
    }
}
