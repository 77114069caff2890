//! Injected dependencies that are not stores.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// Session records and archive entries are stamped through this trait, so
/// tests can pin timestamps with a fixed clock.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
