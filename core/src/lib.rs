//! # EventMingle Core
//!
//! Domain records and storage abstractions shared by every EventMingle crate.
//!
//! The platform is a set of thin CRUD surfaces (admin dashboard, event-manager
//! dashboard, the consumer app) over one relational database. This crate holds
//! the parts that do not know about HTTP or SQL:
//!
//! - **Entities**: `Event`, `User`, `Chat`, `Message`, `Venue`, `Ticket`, ...
//!   each with a create payload (`Draft`) and an update payload (`Patch`)
//! - **Validation**: shape checks applied when drafts and patches are accepted
//! - **`RecordStore`**: a dyn-compatible document store keyed by
//!   `(collection, id)`, implemented by `eventmingle-postgres` and by the
//!   in-memory store in `eventmingle-testing`
//! - **`Collection<R>`**: the typed record layer handlers talk to
//!
//! ## Example
//!
//! ```ignore
//! use eventmingle_core::{Collection, entities::{Event, EventDraft}};
//!
//! let events: Collection<Event> = Collection::new(store, clock);
//! let event = events.create(draft).await?;
//! assert_eq!(events.get(event.id).await?.map(|e| e.title), Some(event.title));
//! ```

pub mod entities;
pub mod error;
pub mod record;
pub mod store;
pub mod validate;

pub use error::{StoreError, ValidationError};
pub use record::{Collection, Immutable, Record, Resource, WriteError};
pub use store::{Filter, ListQuery, RecordStore, SortOrder};

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

/// Environment abstractions injected into the record layer.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time so timestamps are deterministic in tests.
    ///
    /// # Examples
    ///
    /// ```
    /// use eventmingle_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = chrono::Utc::now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
