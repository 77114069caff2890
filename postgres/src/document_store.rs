//! Persisted counts, session ledger and logout archive.

use crate::{connect_pool, migrate, store_error};
use chrono::{DateTime, Utc};
use co2_tracker_core::{
    ArchiveEntry, Category, CheckoutBatch, CumulativeTotals, DocumentStore, Equivalents,
    ExchangedItems, RankedItem, SessionRecord, StoreError, StoreFuture, StoredCategory,
    StoredItem,
};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use std::time::Duration;

type SessionRow = (f64, Json<Equivalents>, Json<ExchangedItems>, DateTime<Utc>);
type ArchiveRow = (
    Option<String>,
    i64,
    Json<Vec<RankedItem>>,
    Json<CumulativeTotals>,
    DateTime<Utc>,
);

/// PostgreSQL-backed document store.
///
/// Single writes run directly on the pool. The composite
/// [`DocumentStore::commit_checkout`] and [`DocumentStore::archive_and_reset`]
/// run in one transaction each.
///
/// # Example
///
/// ```no_run
/// use co2_tracker_core::DocumentStore;
/// use co2_tracker_postgres::PostgresDocumentStore;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), co2_tracker_core::StoreError> {
/// let store = PostgresDocumentStore::from_pool(pool);
/// let sessions = store.get_all_sessions().await?;
/// println!("Sessions since last logout: {}", sessions.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with a pool of at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = connect_pool(database_url, max_connections, Duration::from_secs(30)).await?;
        Ok(Self::from_pool(pool))
    }

    /// Apply schema migrations to this store's database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        migrate(&self.pool).await
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", &e))
    }

    async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to start transaction", &e))
    }
}

async fn write_item(
    conn: &mut PgConnection,
    category: &str,
    name: &str,
    count: u32,
    co2: f64,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE exchange_items SET count = $3, co2 = $4 WHERE category = $1 AND name = $2")
        .bind(category)
        .bind(name)
        .bind(i64::from(count))
        .bind(co2)
        .execute(conn)
        .await
        .map_err(|e| store_error("Failed to update item", &e))?;
    Ok(())
}

async fn write_session(conn: &mut PgConnection, session: &SessionRecord) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO exchange_sessions (total_co2, equivalents, exchanged_items, recorded_at)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(session.total_co2)
    .bind(Json(&session.equivalents))
    .bind(Json(&session.exchanged_items))
    .bind(session.recorded_at)
    .execute(conn)
    .await
    .map_err(|e| store_error("Failed to insert session", &e))?;
    Ok(())
}

async fn delete_sessions(conn: &mut PgConnection) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM exchange_sessions")
        .execute(conn)
        .await
        .map_err(|e| store_error("Failed to clear sessions", &e))?;
    Ok(result.rows_affected())
}

async fn zero_counts(conn: &mut PgConnection, categories: &[Category]) -> Result<(), StoreError> {
    let (category_names, item_names): (Vec<String>, Vec<String>) = categories
        .iter()
        .flat_map(|category| {
            category
                .items
                .iter()
                .map(|item| (category.name.clone(), item.name.clone()))
        })
        .unzip();

    sqlx::query(
        r"
        UPDATE exchange_items SET count = 0, co2 = 0
        WHERE (category, name) IN (SELECT * FROM UNNEST($1::text[], $2::text[]))
        ",
    )
    .bind(category_names)
    .bind(item_names)
    .execute(conn)
    .await
    .map_err(|e| store_error("Failed to reset counts", &e))?;
    Ok(())
}

async fn write_archive(conn: &mut PgConnection, entry: &ArchiveEntry) -> Result<(), StoreError> {
    let session_count = i64::try_from(entry.session_count)
        .map_err(|e| StoreError::Serialization(format!("Session count out of range: {e}")))?;

    sqlx::query(
        r"
        INSERT INTO logout_archive (user_name, session_count, sorted_items, totals, archived_at)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(entry.user_name.as_deref())
    .bind(session_count)
    .bind(Json(&entry.sorted_items))
    .bind(Json(&entry.totals))
    .bind(entry.archived_at)
    .execute(conn)
    .await
    .map_err(|e| store_error("Failed to insert archive entry", &e))?;
    Ok(())
}

fn decode_count(count: i64) -> Result<u32, StoreError> {
    u32::try_from(count).map_err(|e| StoreError::Serialization(format!("Invalid count {count}: {e}")))
}

/// Groups rows ordered by position into categories.
fn group_items(rows: Vec<(String, String, i64, f64, f64)>) -> Result<Vec<StoredCategory>, StoreError> {
    let mut categories: Vec<StoredCategory> = Vec::new();

    for (category, name, count, co2, base_co2) in rows {
        let item = StoredItem {
            name,
            count: decode_count(count)?,
            co2,
            base_co2,
        };
        if let Some(last) = categories.last_mut().filter(|last| last.category == category) {
            last.items.push(item);
        } else {
            categories.push(StoredCategory {
                category,
                items: vec![item],
            });
        }
    }

    Ok(categories)
}

impl DocumentStore for PostgresDocumentStore {
    fn count_documents(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exchange_items")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| store_error("Failed to count items", &e))?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }

    fn insert_items<'a>(&'a self, categories: &'a [Category]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut tx = self.begin().await?;

            let items: Vec<(&Category, &co2_tracker_core::Item)> = categories
                .iter()
                .flat_map(|category| category.items.iter().map(move |item| (category, item)))
                .collect();
            for (position, (category, item)) in (0_i32..).zip(items) {
                sqlx::query(
                    r"
                    INSERT INTO exchange_items (category, name, count, co2, base_co2, position)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (category, name) DO NOTHING
                    ",
                )
                .bind(&category.name)
                .bind(&item.name)
                .bind(i64::from(item.count()))
                .bind(item.co2())
                .bind(item.base_co2)
                .bind(position)
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("Failed to insert item", &e))?;
            }

            tx.commit()
                .await
                .map_err(|e| store_error("Failed to commit transaction", &e))
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
            let mut conn = self.acquire().await?;
            write_item(&mut conn, category, name, count, co2).await
        })
    }

    fn get_updated_items(&self) -> StoreFuture<'_, Vec<StoredCategory>> {
        Box::pin(async move {
            let rows: Vec<(String, String, i64, f64, f64)> = sqlx::query_as(
                "SELECT category, name, count, co2, base_co2 FROM exchange_items ORDER BY position",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to load items", &e))?;

            group_items(rows)
        })
    }

    fn insert_session<'a>(&'a self, session: &'a SessionRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut conn = self.acquire().await?;
            write_session(&mut conn, session).await
        })
    }

    fn get_all_sessions(&self) -> StoreFuture<'_, Vec<SessionRecord>> {
        Box::pin(async move {
            let rows: Vec<SessionRow> = sqlx::query_as(
                r"
                SELECT total_co2, equivalents, exchanged_items, recorded_at
                FROM exchange_sessions
                ORDER BY id
                ",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to load sessions", &e))?;

            Ok(rows
                .into_iter()
                .map(|(total_co2, equivalents, exchanged_items, recorded_at)| SessionRecord {
                    total_co2,
                    equivalents: equivalents.0,
                    exchanged_items: exchanged_items.0,
                    recorded_at,
                })
                .collect())
        })
    }

    fn clear_sessions(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut conn = self.acquire().await?;
            let deleted = delete_sessions(&mut conn).await?;
            tracing::debug!(deleted, "Session rows deleted");
            Ok(())
        })
    }

    fn reset_counts<'a>(&'a self, categories: &'a [Category]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut conn = self.acquire().await?;
            zero_counts(&mut conn, categories).await
        })
    }

    fn log_out<'a>(&'a self, entry: &'a ArchiveEntry) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut conn = self.acquire().await?;
            write_archive(&mut conn, entry).await
        })
    }

    fn get_archive(&self) -> StoreFuture<'_, Vec<ArchiveEntry>> {
        Box::pin(async move {
            let rows: Vec<ArchiveRow> = sqlx::query_as(
                r"
                SELECT user_name, session_count, sorted_items, totals, archived_at
                FROM logout_archive
                ORDER BY id
                ",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to load archive", &e))?;

            rows.into_iter()
                .map(|(user_name, session_count, sorted_items, totals, archived_at)| {
                    Ok(ArchiveEntry {
                        user_name,
                        session_count: usize::try_from(session_count).map_err(|e| {
                            StoreError::Serialization(format!("Invalid session count: {e}"))
                        })?,
                        sorted_items: sorted_items.0,
                        totals: totals.0,
                        archived_at,
                    })
                })
                .collect::<Result<Vec<_>, StoreError>>()
        })
    }

    fn commit_checkout<'a>(&'a self, batch: &'a CheckoutBatch) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut tx = self.begin().await?;

            for update in &batch.updates {
                write_item(&mut tx, &update.category, &update.name, update.count, update.co2)
                    .await?;
            }
            if let Some(session) = &batch.session {
                write_session(&mut tx, session).await?;
            }

            // Dropping the transaction on an earlier `?` rolls it back
            tx.commit()
                .await
                .map_err(|e| store_error("Failed to commit checkout", &e))
        })
    }

    fn archive_and_reset<'a>(
        &'a self,
        entry: &'a ArchiveEntry,
        categories: &'a [Category],
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut tx = self.begin().await?;

            write_archive(&mut tx, entry).await?;
            zero_counts(&mut tx, categories).await?;
            let deleted = delete_sessions(&mut tx).await?;

            tx.commit()
                .await
                .map_err(|e| store_error("Failed to commit logout", &e))?;

            tracing::debug!(deleted, "Ledger archived in one transaction");
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_group_items_by_position() {
        let rows = vec![
            ("Cups".to_string(), "Mug".to_string(), 2, 1.0, 0.5),
            ("Cups".to_string(), "Bottle".to_string(), 0, 0.0, 1.5),
            ("Bags".to_string(), "Tote".to_string(), 1, 2.0, 2.0),
        ];

        let grouped = group_items(rows).unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].category, "Cups");
        assert_eq!(grouped[0].items.len(), 2);
        assert_eq!(grouped[1].items[0].name, "Tote");
        assert_eq!(grouped[1].items[0].count, 1);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let rows = vec![("Cups".to_string(), "Mug".to_string(), -1, 0.0, 0.5)];

        let err = group_items(rows).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
