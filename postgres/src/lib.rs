//! `PostgreSQL` backends for the CO2 exchange tracker.
//!
//! This crate implements the store traits from `co2-tracker-core` on top of
//! sqlx:
//!
//! - [`PostgresCatalog`]: read-only item catalog (`categories`, `catalog_items`)
//! - [`PostgresDocumentStore`]: persisted counts, session ledger and logout
//!   archive (`exchange_items`, `exchange_sessions`, `logout_archive`)
//!
//! Checkouts and logouts run inside a single transaction, so a failure part
//! way through leaves no partial writes behind.
//!
//! # Example
//!
//! ```no_run
//! use co2_tracker_postgres::{PostgresCatalog, PostgresDocumentStore};
//!
//! # async fn example() -> Result<(), co2_tracker_core::StoreError> {
//! let documents = PostgresDocumentStore::connect("postgres://localhost/co2", 5).await?;
//! documents.migrate().await?;
//! let catalog = PostgresCatalog::from_pool(documents.pool().clone());
//! # drop(catalog);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod document_store;

pub use catalog::PostgresCatalog;
pub use document_store::PostgresDocumentStore;

use co2_tracker_core::StoreError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Opens a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if no connection can be established.
pub async fn connect_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Failed to connect: {e}")))
}

/// Applies the bundled schema migrations.
///
/// Covers both the catalog and the document tables, so it can be run against
/// either pool.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Maps a sqlx error, separating connectivity problems from query failures.
pub(crate) fn store_error(context: &str, error: &sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{context}: {error}"))
        },
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(format!("{context}: {error}"))
        },
        _ => StoreError::Database(format!("{context}: {error}")),
    }
}
