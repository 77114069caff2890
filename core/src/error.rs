//! Error types for the tracker core.

use thiserror::Error;

/// Errors raised by catalog and document store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query or write failed in the backing database.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backend is not reachable or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by tracker operations.
///
/// A [`TrackerError::LookupMiss`] is ignorable: the request names an item that
/// does not exist and nothing changed. A [`TrackerError::Store`] means a
/// persistence step failed and the operation was aborted.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// No item with this name exists in the catalog.
    #[error("Item not found: {item_name}")]
    LookupMiss {
        /// The name that was looked up
        item_name: String,
    },

    /// A document store or catalog operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrackerError {
    /// Whether the caller may carry on as if nothing happened.
    #[must_use]
    pub const fn is_ignorable(&self) -> bool {
        matches!(self, Self::LookupMiss { .. })
    }
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
