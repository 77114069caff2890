//! Fixed catalog for tests.

use co2_tracker_core::{CatalogStore, Category, StoreFuture};

/// `CatalogStore` that always returns the same categories.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    categories: Vec<Category>,
}

impl StaticCatalog {
    /// Creates a catalog returning these categories.
    #[must_use]
    pub const fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }
}

impl CatalogStore for StaticCatalog {
    fn get_data_grouped_by_category(&self) -> StoreFuture<'_, Vec<Category>> {
        let categories = self.categories.clone();
        Box::pin(async move { Ok(categories) })
    }
}
