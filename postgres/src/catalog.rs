//! Item catalog read from `categories` and `catalog_items`.

use crate::store_error;
use co2_tracker_core::{CatalogStore, Category, Item, StoreError, StoreFuture};
use sqlx::PgPool;

/// PostgreSQL-backed item catalog.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id SERIAL PRIMARY KEY,
///     name TEXT NOT NULL UNIQUE,
///     position INTEGER NOT NULL DEFAULT 0
/// );
/// CREATE TABLE catalog_items (
///     id SERIAL PRIMARY KEY,
///     category_id INTEGER NOT NULL REFERENCES categories(id),
///     name TEXT NOT NULL,
///     base_co2 DOUBLE PRECISION NOT NULL,
///     position INTEGER NOT NULL DEFAULT 0
/// );
/// ```
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Create a catalog over an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds a category and its items at the end of the catalog.
    ///
    /// Used to seed a fresh database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the category already exists or an insert fails.
    pub async fn add_category(&self, name: &str, items: &[(&str, f64)]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to start transaction", &e))?;

        let (category_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO categories (name, position)
            VALUES ($1, (SELECT COALESCE(MAX(position) + 1, 0) FROM categories))
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to insert category", &e))?;

        for (position, (item_name, base_co2)) in (0_i32..).zip(items) {
            sqlx::query(
                r"
                INSERT INTO catalog_items (category_id, name, base_co2, position)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(category_id)
            .bind(item_name)
            .bind(base_co2)
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("Failed to insert catalog item", &e))?;
        }

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit transaction", &e))?;

        tracing::info!(category = name, items = items.len(), "Catalog category added");
        Ok(())
    }
}

impl CatalogStore for PostgresCatalog {
    fn get_data_grouped_by_category(&self) -> StoreFuture<'_, Vec<Category>> {
        Box::pin(async move {
            let rows: Vec<(String, Option<String>, Option<f64>)> = sqlx::query_as(
                r"
                SELECT c.name, i.name, i.base_co2
                FROM categories c
                LEFT JOIN catalog_items i ON i.category_id = c.id
                ORDER BY c.position, c.id, i.position, i.id
                ",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to load catalog", &e))?;

            Ok(group_rows(rows))
        })
    }
}

/// Groups ordered join rows into categories, keeping empty categories.
fn group_rows(rows: Vec<(String, Option<String>, Option<f64>)>) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();

    for (category, item_name, base_co2) in rows {
        if categories.last().is_none_or(|last| last.name != category) {
            categories.push(Category::new(category, Vec::new()));
        }
        if let (Some(name), Some(base_co2), Some(last)) = (item_name, base_co2, categories.last_mut()) {
            last.items.push(Item::new(name, base_co2));
        }
    }

    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_rows_keeps_order_and_empty_categories() {
        let rows = vec![
            ("Cups".to_string(), Some("Mug".to_string()), Some(0.5)),
            ("Cups".to_string(), Some("Bottle".to_string()), Some(1.5)),
            ("Cutlery".to_string(), None, None),
            ("Bags".to_string(), Some("Tote".to_string()), Some(2.0)),
        ];

        let categories = group_rows(rows);

        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Cups", "Cutlery", "Bags"]);
        assert_eq!(categories[0].items.len(), 2);
        assert_eq!(categories[0].items[1].name, "Bottle");
        assert!(categories[1].items.is_empty());
        assert_eq!(categories[2].items[0].count(), 0);
    }
}
