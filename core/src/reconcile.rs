//! Reconciliation between the item table, the document store and the
//! session ledger.
//!
//! # Lifecycle
//!
//! ```text
//!   increment / decrement          commit (total > 0)            logout
//! ┌──────────────┐        ┌───────────────────────────┐     ┌──────────┐
//! │     Idle     │ ─────► │ Committed-pending-archive │ ──► │ Archived │
//! └──────────────┘        └───────────────────────────┘     └──────────┘
//!        ▲                                                        │
//!        └────────────────────────────────────────────────────────┘
//! ```
//!
//! - Increments and decrements only touch the [`ItemTable`].
//! - A commit writes exchanged items to the document store, appends a
//!   [`SessionRecord`] when the total is positive, then clears the table.
//! - A logout folds the ledger into one [`ArchiveEntry`], zeroes persisted
//!   counts and empties the ledger. With an empty ledger it does nothing.
//! - The two administrative operations bypass this flow.

use crate::environment::Clock;
use crate::equivalents::{EquivalenceFactors, Equivalents};
use crate::error::{Result, StoreError};
use crate::item_table::ItemTable;
use crate::store::{CheckoutBatch, DocumentStore, ItemUpdate};
use crate::types::{
    flatten_stored, rank_by_count, ArchiveEntry, Category, CumulativeTotals, RankedItem,
    SessionRecord,
};
use std::sync::Arc;

/// Result of a checkout.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitOutcome {
    /// Number of item documents updated
    pub items_updated: usize,
    /// The session record written, if the total was positive
    pub session: Option<SessionRecord>,
}

/// Result of a logout.
#[derive(Clone, Debug, PartialEq)]
pub enum LogoutOutcome {
    /// The ledger was empty; nothing was written
    Skipped,
    /// The ledger was folded into this archive entry
    Archived(ArchiveEntry),
}

/// Persisted state shown on the operator dashboard.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LedgerSummary {
    /// Totals over the sessions recorded since the last logout
    pub totals: CumulativeTotals,
    /// Persisted items ranked by count
    pub ranked_items: Vec<RankedItem>,
}

/// Drives every transition that touches persisted state.
#[derive(Clone)]
pub struct Reconciler {
    documents: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    factors: EquivalenceFactors,
}

impl Reconciler {
    /// Creates a reconciler over a document store.
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        factors: EquivalenceFactors,
    ) -> Self {
        Self {
            documents,
            clock,
            factors,
        }
    }

    /// Equivalents of a CO2 total under the configured factors.
    #[must_use]
    pub fn equivalents(&self, total_co2: f64) -> Equivalents {
        self.factors.equivalents(total_co2)
    }

    /// Seeds the document store from the catalog when it holds no items.
    ///
    /// Returns `true` if items were inserted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if counting or inserting fails.
    pub async fn bootstrap(&self, catalog: &[Category]) -> Result<bool> {
        let existing = self.documents.count_documents().await?;
        if existing > 0 {
            tracing::info!(documents = existing, "Document store already seeded");
            return Ok(false);
        }

        self.documents.insert_items(catalog).await?;
        tracing::info!(categories = catalog.len(), "Seeded document store from catalog");
        Ok(true)
    }

    /// Commits the table's exchanged items and clears it.
    ///
    /// The table is cleared only after the document store accepted the whole
    /// checkout. On failure the table keeps its counts so the operator can
    /// retry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if the checkout could not be persisted.
    pub async fn commit(&self, table: &mut ItemTable) -> Result<CommitOutcome> {
        let batch = self.checkout_batch(table);

        if let Err(error) = self.documents.commit_checkout(&batch).await {
            metrics::counter!("co2_tracker_commit_failures_total").increment(1);
            tracing::error!(
                error = %error,
                items = batch.updates.len(),
                "Checkout failed; in-memory counts kept"
            );
            return Err(error.into());
        }

        table.reset_local();

        metrics::counter!("co2_tracker_commits_total").increment(1);
        if let Some(session) = &batch.session {
            metrics::counter!("co2_tracker_sessions_recorded_total").increment(1);
            metrics::histogram!("co2_tracker_co2_committed_kg").record(session.total_co2);
            tracing::info!(
                total_co2 = session.total_co2,
                items = batch.updates.len(),
                "Session recorded"
            );
        } else {
            tracing::debug!("Checkout with zero total; no session recorded");
        }

        Ok(CommitOutcome {
            items_updated: batch.updates.len(),
            session: batch.session,
        })
    }

    fn checkout_batch(&self, table: &ItemTable) -> CheckoutBatch {
        let updates = table
            .categories()
            .iter()
            .flat_map(|category| {
                category
                    .items
                    .iter()
                    .filter(|item| item.is_exchanged())
                    .map(|item| ItemUpdate {
                        category: category.name.clone(),
                        name: item.name.clone(),
                        count: item.count(),
                        co2: item.co2(),
                    })
            })
            .collect();

        let total_co2 = table.total_co2();
        let session = (total_co2 > 0.0).then(|| SessionRecord {
            total_co2,
            equivalents: self.factors.equivalents(total_co2),
            exchanged_items: table.exchanged_items(),
            recorded_at: self.clock.now(),
        });

        CheckoutBatch { updates, session }
    }

    /// Folds the session ledger into the logout archive.
    ///
    /// `catalog` names the items whose persisted counts are zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if reading the ledger or archiving fails.
    pub async fn logout(
        &self,
        user_name: Option<&str>,
        catalog: &[Category],
    ) -> Result<LogoutOutcome> {
        let sessions = self.documents.get_all_sessions().await?;
        let totals = CumulativeTotals::fold(&sessions);

        if totals.session_count == 0 {
            tracing::info!(user_name, "Logout with empty ledger; nothing archived");
            return Ok(LogoutOutcome::Skipped);
        }

        let stored = self.documents.get_updated_items().await?;
        let entry = ArchiveEntry {
            user_name: user_name.map(str::to_string),
            session_count: totals.session_count,
            sorted_items: rank_by_count(flatten_stored(&stored)),
            totals,
            archived_at: self.clock.now(),
        };

        self.documents.archive_and_reset(&entry, catalog).await?;

        metrics::counter!("co2_tracker_logouts_archived_total").increment(1);
        tracing::info!(
            user_name,
            sessions = entry.session_count,
            total_co2 = entry.totals.total_co2,
            "Ledger archived"
        );

        Ok(LogoutOutcome::Archived(entry))
    }

    /// Forces persisted counts to zero without archiving.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if the update fails.
    pub async fn admin_reset(&self, catalog: &[Category]) -> Result<()> {
        self.documents.reset_counts(catalog).await?;
        tracing::warn!("Persisted item counts force-reset by operator");
        Ok(())
    }

    /// Deletes every session record without archiving.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if the delete fails.
    pub async fn clear_sessions(&self) -> Result<()> {
        self.documents.clear_sessions().await?;
        tracing::warn!("Session ledger cleared by operator");
        Ok(())
    }

    /// Reads cumulative totals and the popularity ranking.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if either read fails.
    pub async fn ledger_summary(&self) -> Result<LedgerSummary> {
        let sessions = self.documents.get_all_sessions().await?;
        let stored = self.documents.get_updated_items().await?;

        Ok(LedgerSummary {
            totals: CumulativeTotals::fold(&sessions),
            ranked_items: rank_by_count(flatten_stored(&stored)),
        })
    }

    /// Checks that the document store answers.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] raised by the probe.
    pub async fn ping(&self) -> std::result::Result<u64, StoreError> {
        self.documents.count_documents().await
    }
}
