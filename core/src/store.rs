//! Persistence traits consumed by the reconciliation logic.
//!
//! # Implementations
//!
//! - `PostgresCatalog` / `PostgresDocumentStore` (in `co2-tracker-postgres`): production
//! - `StaticCatalog` / `InMemoryDocumentStore` (in `co2-tracker-testing`): fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures instead of using `async fn` so both traits can
//! be shared as `Arc<dyn CatalogStore>` / `Arc<dyn DocumentStore>`.

use crate::error::StoreError;
use crate::types::{ArchiveEntry, Category, SessionRecord, StoredCategory};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// One persisted item update within a checkout.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemUpdate {
    /// Category the item belongs to
    pub category: String,
    /// Item name
    pub name: String,
    /// New count
    pub count: u32,
    /// New CO2, in kilograms
    pub co2: f64,
}

/// Everything a checkout writes.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutBatch {
    /// Item updates, in catalog order
    pub updates: Vec<ItemUpdate>,
    /// Session record to append, present only when the total is positive
    pub session: Option<SessionRecord>,
}

/// Read-only source of the item catalog.
pub trait CatalogStore: Send + Sync {
    /// Loads all categories with their items, in catalog order.
    ///
    /// Every returned item has a zero count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog cannot be read.
    fn get_data_grouped_by_category(&self) -> StoreFuture<'_, Vec<Category>>;
}

/// Document store holding persisted items, the session ledger and the
/// logout archive.
pub trait DocumentStore: Send + Sync {
    /// Number of item documents stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn count_documents(&self) -> StoreFuture<'_, u64>;

    /// Seeds item documents from the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn insert_items<'a>(&'a self, categories: &'a [Category]) -> StoreFuture<'a, ()>;

    /// Overwrites the persisted count and CO2 of one item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    fn update_item<'a>(
        &'a self,
        category: &'a str,
        name: &'a str,
        count: u32,
        co2: f64,
    ) -> StoreFuture<'a, ()>;

    /// Loads the persisted items grouped by category.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn get_updated_items(&self) -> StoreFuture<'_, Vec<StoredCategory>>;

    /// Appends a session record to the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn insert_session<'a>(&'a self, session: &'a SessionRecord) -> StoreFuture<'a, ()>;

    /// Loads every session record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn get_all_sessions(&self) -> StoreFuture<'_, Vec<SessionRecord>>;

    /// Deletes every session record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn clear_sessions(&self) -> StoreFuture<'_, ()>;

    /// Sets the persisted count and CO2 of every catalog item to zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    fn reset_counts<'a>(&'a self, categories: &'a [Category]) -> StoreFuture<'a, ()>;

    /// Appends an entry to the logout archive.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn log_out<'a>(&'a self, entry: &'a ArchiveEntry) -> StoreFuture<'a, ()>;

    /// Loads the logout archive, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn get_archive(&self) -> StoreFuture<'_, Vec<ArchiveEntry>>;

    /// Writes a whole checkout.
    ///
    /// The default implementation issues `update_item` for each update and
    /// then `insert_session`, stopping at the first failure; writes that
    /// already succeeded stay in place. Backends with transactions should
    /// override this to make the checkout atomic.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] encountered.
    fn commit_checkout<'a>(&'a self, batch: &'a CheckoutBatch) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            for update in &batch.updates {
                self.update_item(&update.category, &update.name, update.count, update.co2)
                    .await?;
            }
            if let Some(session) = &batch.session {
                self.insert_session(session).await?;
            }
            Ok(())
        })
    }

    /// Archives a logout: writes the entry, zeroes persisted counts and
    /// clears the session ledger.
    ///
    /// The default implementation runs the three steps in order, stopping at
    /// the first failure. Backends with transactions should override this.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] encountered.
    fn archive_and_reset<'a>(
        &'a self,
        entry: &'a ArchiveEntry,
        categories: &'a [Category],
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.log_out(entry).await?;
            self.reset_counts(categories).await?;
            self.clear_sessions().await
        })
    }
}
