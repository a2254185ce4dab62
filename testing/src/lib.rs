//! # NativeNest Testing
//!
//! Testing utilities for the NativeNest stall booking core.
//!
//! This crate provides:
//! - [`InMemoryStallStore`]: an in-memory [`StallRegistry`](nativenest_core::StallRegistry)
//!   with the same business semantics as the Postgres store
//! - [`FixedClock`]: deterministic timestamps for assertions
//!
//! ## Example
//!
//! ```ignore
//! use nativenest_core::{NewStallType, StallRegistry};
//! use nativenest_testing::InMemoryStallStore;
//!
//! #[tokio::test]
//! async fn test_booking_flow() {
//!     let store = InMemoryStallStore::new();
//!     let event_id = store.insert_event("Handloom Expo", 20);
//!     let builder_id = store.insert_builder("Acme Stalls");
//!
//!     let gold = store
//!         .create_stall_type(event_id, &NewStallType::new("Gold", 6, 500_000))
//!         .await
//!         .unwrap();
//!     let stall = store.book_stall(event_id, gold.stall_type_id, builder_id).await.unwrap();
//!     assert_eq!(stall.stall_number, 1);
//! }
//! ```

mod stall_store;

pub use stall_store::InMemoryStallStore;

/// Mock collaborators.
pub mod mocks {
    use chrono::{DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, so booking and creation timestamps can
    /// be asserted exactly.
    ///
    /// # Example
    ///
    /// ```
    /// use nativenest_testing::mocks::FixedClock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// The fixed time
        #[must_use]
        pub const fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}
