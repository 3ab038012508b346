//! Error types for the record layer.

use thiserror::Error;

/// A draft or patch was rejected before reaching the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was missing or blank.
    #[error("{field} must not be empty")]
    Empty {
        /// Offending field.
        field: &'static str,
    },

    /// An email field does not look like `local@domain`.
    #[error("{field} is not a valid email address")]
    InvalidEmail {
        /// Offending field.
        field: &'static str,
    },

    /// A currency field is not a three-letter code.
    #[error("{field} must be a three-letter currency code")]
    InvalidCurrency {
        /// Offending field.
        field: &'static str,
    },

    /// An event would end before it starts.
    #[error("end_time must not be before start_time")]
    EndBeforeStart,

    /// Any other field-level rule.
    #[error("{field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised by a [`RecordStore`](crate::RecordStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection, query, or driver failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A unique index rejected the write.
    #[error("Unique constraint violated in {collection}: {detail}")]
    Conflict {
        /// Collection the write targeted.
        collection: String,
        /// Driver or index detail.
        detail: String,
    },

    /// The collection name is not one the schema knows.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::Empty { field: "title" }.to_string(),
            "title must not be empty"
        );
        assert_eq!(
            ValidationError::EndBeforeStart.to_string(),
            "end_time must not be before start_time"
        );
    }

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err = serde_json::from_str::<u32>("\"nope\"").map_err(StoreError::from);
        assert!(matches!(err, Err(StoreError::Serialization(_))));
    }
}
