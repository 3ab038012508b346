//! # EventMingle Testing
//!
//! Testing utilities for the EventMingle crates.
//!
//! This crate provides:
//! - `InMemoryRecordStore`: a `RecordStore` with the same semantics as the
//!   Postgres store, including its unique indexes
//! - `FixedClock`: deterministic, manually advanced time
//! - `fixtures`: ready-made drafts for every entity
//!
//! ## Example
//!
//! ```ignore
//! use eventmingle_core::{Collection, entities::Event};
//! use eventmingle_testing::{InMemoryRecordStore, test_clock, fixtures};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_event_roundtrip() {
//!     let events: Collection<Event> =
//!         Collection::new(Arc::new(InMemoryRecordStore::new()), Arc::new(test_clock()));
//!     let created = events.create(fixtures::event_draft("Meetup")).await.unwrap();
//!     assert!(events.get(created.id).await.unwrap().is_some());
//! }
//! ```

pub mod fixtures;
pub mod memory_store;

pub use memory_store::InMemoryRecordStore;
pub use mocks::{FixedClock, test_clock};

/// Mock implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use eventmingle_core::environment::Clock;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests.
    ///
    /// Returns the same time until explicitly advanced.
    ///
    /// # Example
    ///
    /// ```
    /// use eventmingle_testing::mocks::FixedClock;
    /// use eventmingle_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let t1 = clock.now();
    /// assert_eq!(t1, clock.now());
    /// clock.advance(Duration::seconds(5));
    /// assert_eq!(clock.now() - t1, Duration::seconds(5));
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        micros: AtomicI64,
    }

    impl FixedClock {
        /// Create a new fixed clock at the given time.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                micros: AtomicI64::new(time.timestamp_micros()),
            }
        }

        /// Move the clock forward (or backward, for negative durations).
        pub fn advance(&self, by: Duration) {
            let delta = by.num_microseconds().unwrap_or(i64::MAX);
            self.micros.fetch_add(delta, Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp_micros(self.micros.load(Ordering::SeqCst)).unwrap_or_default()
        }
    }

    /// Default fixed clock for tests (2025-01-01 00:00:00 UTC).
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use eventmingle_core::environment::Clock;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = test_clock();
        let start = clock.now();
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now() - start, Duration::minutes(90));
    }
}
