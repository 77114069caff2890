//! # CO2 Tracker Testing
//!
//! Testing utilities for the CO2 exchange tracker.
//!
//! This crate provides:
//! - [`InMemoryDocumentStore`]: `DocumentStore` backed by plain vectors, with
//!   write-failure injection
//! - [`StaticCatalog`]: `CatalogStore` returning a fixed catalog
//! - [`FixedClock`]: deterministic time
//! - [`fixtures`]: a small sample catalog
//!
//! ## Example
//!
//! ```
//! use co2_tracker_core::{EquivalenceFactors, Reconciler, TrackerService};
//! use co2_tracker_testing::{fixtures, test_clock, InMemoryDocumentStore, StaticCatalog};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), co2_tracker_core::TrackerError> {
//! let documents = Arc::new(InMemoryDocumentStore::new());
//! let reconciler = Reconciler::new(documents.clone(), Arc::new(test_clock()), EquivalenceFactors::default());
//! let service = TrackerService::load(&StaticCatalog::new(fixtures::sample_catalog()), reconciler).await?;
//!
//! assert!(documents.sessions().is_empty());
//! # drop(service);
//! # Ok(())
//! # }
//! ```

mod catalog;
mod document_store;

pub use catalog::StaticCatalog;
pub use document_store::InMemoryDocumentStore;

use chrono::{DateTime, Utc};
use co2_tracker_core::environment::Clock;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use co2_tracker_testing::mocks::FixedClock;
    /// use co2_tracker_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
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
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-06-01 12:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Sample catalogs.
pub mod fixtures {
    use co2_tracker_core::{Category, Item};

    /// Two categories, three items.
    ///
    /// | Category | Item | base CO2 (kg) |
    /// |---|---|---|
    /// | Cups | Mug | 0.5 |
    /// | Cups | Bottle | 1.5 |
    /// | Bags | Tote | 2.0 |
    #[must_use]
    pub fn sample_catalog() -> Vec<Category> {
        vec![
            Category::new("Cups", vec![Item::new("Mug", 0.5), Item::new("Bottle", 1.5)]),
            Category::new("Bags", vec![Item::new("Tote", 2.0)]),
        ]
    }
}

/// Installs a `tracing` subscriber that writes to the test harness.
///
/// Safe to call from several tests; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("co2_tracker=debug")
        .try_init();
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_sample_catalog_starts_clear() {
        let catalog = fixtures::sample_catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog
            .iter()
            .flat_map(|c| c.items.iter())
            .all(|item| item.count() == 0));
    }
}
