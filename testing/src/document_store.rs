//! In-memory document store for fast, deterministic tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use co2_tracker_core::{
    ArchiveEntry, Category, DocumentStore, SessionRecord, StoreError, StoreFuture,
    StoredCategory, StoredItem,
};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Documents {
    items: Vec<StoredCategory>,
    sessions: Vec<SessionRecord>,
    archive: Vec<ArchiveEntry>,
    writes: usize,
    fail_after: Option<usize>,
}

impl Documents {
    /// Counts a write, or fails it if the failure budget is spent.
    fn begin_write(&mut self, operation: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.fail_after {
            if self.writes >= limit {
                return Err(StoreError::Database(format!(
                    "injected failure during {operation}"
                )));
            }
        }
        self.writes += 1;
        Ok(())
    }

    fn item_mut(&mut self, category: &str, name: &str) -> Option<&mut StoredItem> {
        self.items
            .iter_mut()
            .filter(|c| c.category == category)
            .flat_map(|c| c.items.iter_mut())
            .find(|item| item.name == name)
    }
}

/// `DocumentStore` held in memory.
///
/// Cloning shares the underlying documents, so a test can keep one handle for
/// assertions while the reconciler writes through another.
///
/// # Example
///
/// ```
/// use co2_tracker_core::DocumentStore;
/// use co2_tracker_testing::{fixtures, InMemoryDocumentStore};
///
/// # async fn example() -> Result<(), co2_tracker_core::StoreError> {
/// let store = InMemoryDocumentStore::new();
/// store.insert_items(&fixtures::sample_catalog()).await?;
/// assert_eq!(store.count_documents().await?, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<Documents>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write after the first `successful_writes` fail.
    pub fn fail_writes_after(&self, successful_writes: usize) {
        let mut docs = self.documents.write().unwrap();
        docs.fail_after = Some(docs.writes + successful_writes);
    }

    /// Stops injecting failures.
    pub fn heal(&self) {
        self.documents.write().unwrap().fail_after = None;
    }

    /// Number of writes accepted so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.documents.read().unwrap().writes
    }

    /// Current session ledger.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.documents.read().unwrap().sessions.clone()
    }

    /// Current logout archive.
    #[must_use]
    pub fn archive(&self) -> Vec<ArchiveEntry> {
        self.documents.read().unwrap().archive.clone()
    }

    /// Persisted state of one item.
    #[must_use]
    pub fn stored_item(&self, category: &str, name: &str) -> Option<StoredItem> {
        self.documents
            .read()
            .unwrap()
            .items
            .iter()
            .filter(|c| c.category == category)
            .flat_map(|c| c.items.iter())
            .find(|item| item.name == name)
            .cloned()
    }

    /// Whether every persisted count is zero.
    #[must_use]
    pub fn all_counts_zero(&self) -> bool {
        self.documents
            .read()
            .unwrap()
            .items
            .iter()
            .flat_map(|c| c.items.iter())
            .all(|item| item.count == 0)
    }

    /// Overwrites a persisted item directly, bypassing failure injection.
    pub fn seed_item(&self, category: &str, name: &str, count: u32, co2: f64) {
        let mut docs = self.documents.write().unwrap();
        if let Some(item) = docs.item_mut(category, name) {
            item.count = count;
            item.co2 = co2;
        }
    }

    /// Appends a session directly, bypassing failure injection.
    pub fn seed_session(&self, session: SessionRecord) {
        self.documents.write().unwrap().sessions.push(session);
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn count_documents(&self) -> StoreFuture<'_, u64> {
        let count = self
            .documents
            .read()
            .unwrap()
            .items
            .iter()
            .map(|c| c.items.len() as u64)
            .sum();
        Box::pin(async move { Ok(count) })
    }

    fn insert_items<'a>(&'a self, categories: &'a [Category]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut docs = self.documents.write().unwrap();
            docs.begin_write("insert_items")?;
            docs.items.extend(categories.iter().map(|category| StoredCategory {
                category: category.name.clone(),
                items: category
                    .items
                    .iter()
                    .map(|item| StoredItem {
                        name: item.name.clone(),
                        count: item.count(),
                        co2: item.co2(),
                        base_co2: item.base_co2,
                    })
                    .collect(),
            }));
            Ok(())
        })
    }

    fn update_item<'a>(
        &'a self,
        category: &'a str,
        name: &'a str,
        count: u32,
        co2: f64,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut docs = self.documents.write().unwrap();
            docs.begin_write("update_item")?;
            if let Some(item) = docs.item_mut(category, name) {
                item.count = count;
                item.co2 = co2;
            }
            Ok(())
        })
    }

    fn get_updated_items(&self) -> StoreFuture<'_, Vec<StoredCategory>> {
        let items = self.documents.read().unwrap().items.clone();
        Box::pin(async move { Ok(items) })
    }

    fn insert_session<'a>(&'a self, session: &'a SessionRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut docs = self.documents.write().unwrap();
            docs.begin_write("insert_session")?;
            docs.sessions.push(session.clone());
            Ok(())
        })
    }

    fn get_all_sessions(&self) -> StoreFuture<'_, Vec<SessionRecord>> {
        let sessions = self.sessions();
        Box::pin(async move { Ok(sessions) })
    }

    fn clear_sessions(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut docs = self.documents.write().unwrap();
            docs.begin_write("clear_sessions")?;
            docs.sessions.clear();
            Ok(())
        })
    }

    fn reset_counts<'a>(&'a self, categories: &'a [Category]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut docs = self.documents.write().unwrap();
            docs.begin_write("reset_counts")?;
            for category in categories {
                for item in &category.items {
                    if let Some(stored) = docs.item_mut(&category.name, &item.name) {
                        stored.count = 0;
                        stored.co2 = 0.0;
                    }
                }
            }
            Ok(())
        })
    }

    fn log_out<'a>(&'a self, entry: &'a ArchiveEntry) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut docs = self.documents.write().unwrap();
            docs.begin_write("log_out")?;
            docs.archive.push(entry.clone());
            Ok(())
        })
    }

    fn get_archive(&self) -> StoreFuture<'_, Vec<ArchiveEntry>> {
        let archive = self.archive();
        Box::pin(async move { Ok(archive) })
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::fixtures::sample_catalog;

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.count_documents().await.unwrap(), 0);

        store.insert_items(&sample_catalog()).await.unwrap();
        assert_eq!(store.count_documents().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_unknown_item_is_noop() {
        let store = InMemoryDocumentStore::new();
        store.insert_items(&sample_catalog()).await.unwrap();

        store.update_item("Cups", "Spork", 4, 2.0).await.unwrap();
        assert!(store.all_counts_zero());
    }

    #[tokio::test]
    async fn test_update_and_reset_counts() {
        let store = InMemoryDocumentStore::new();
        let catalog = sample_catalog();
        store.insert_items(&catalog).await.unwrap();

        store.update_item("Bags", "Tote", 3, 6.0).await.unwrap();
        let tote = store.stored_item("Bags", "Tote").unwrap();
        assert_eq!(tote.count, 3);
        assert_eq!(tote.co2, 6.0);

        store.reset_counts(&catalog).await.unwrap();
        assert!(store.all_counts_zero());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryDocumentStore::new();
        store.insert_items(&sample_catalog()).await.unwrap();
        store.fail_writes_after(1);

        store.update_item("Cups", "Mug", 1, 0.5).await.unwrap();
        let err = store.update_item("Cups", "Bottle", 1, 1.5).await.unwrap_err();
        assert!(err.to_string().contains("update_item"));

        store.heal();
        store.update_item("Cups", "Bottle", 1, 1.5).await.unwrap();
        assert_eq!(store.write_count(), 3);
    }
}
