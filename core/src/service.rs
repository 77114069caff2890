//! The tracker service: owned item state plus the reconciler.
//!
//! # Concurrency
//!
//! The item table sits behind a single [`tokio::sync::Mutex`]. Mutations,
//! commits, logouts and the two administrative operations hold the lock for
//! their whole duration, store calls included. An increment cannot land
//! between a checkout snapshot and the reset that follows it, and a checkout
//! cannot land between a logout's ledger read and the ledger clear. The service still assumes one active operator session at a
//! time: counts are shared by everyone using the instance.

use crate::equivalents::Equivalents;
use crate::error::Result;
use crate::item_table::{ItemAction, ItemTable};
use crate::reconcile::{CommitOutcome, LedgerSummary, LogoutOutcome, Reconciler};
use crate::store::CatalogStore;
use crate::types::Category;
use tokio::sync::Mutex;

/// Current in-memory counts, ready for display.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveView {
    /// Categories with their live counts
    pub categories: Vec<Category>,
    /// Sum of CO2 over all live counts, in kilograms
    pub total_co2: f64,
    /// Equivalents of `total_co2`
    pub equivalents: Equivalents,
}

/// Live view plus the persisted ledger, for the operator dashboard.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardView {
    /// In-memory counts
    pub live: LiveView,
    /// Persisted totals and ranking
    pub ledger: LedgerSummary,
}

/// Shared state behind every HTTP handler.
pub struct TrackerService {
    table: Mutex<ItemTable>,
    reconciler: Reconciler,
}

impl TrackerService {
    /// Creates a service over an already loaded catalog.
    #[must_use]
    pub fn new(catalog: Vec<Category>, reconciler: Reconciler) -> Self {
        Self {
            table: Mutex::new(ItemTable::new(catalog)),
            reconciler,
        }
    }

    /// Loads the catalog, seeds the document store if it is empty and
    /// builds the service.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if the catalog cannot be read
    /// or seeding fails.
    pub async fn load(catalog: &dyn CatalogStore, reconciler: Reconciler) -> Result<Self> {
        let categories = catalog.get_data_grouped_by_category().await?;
        tracing::info!(categories = categories.len(), "Catalog loaded");

        reconciler.bootstrap(&categories).await?;
        Ok(Self::new(categories, reconciler))
    }

    /// The reconciler driving persisted state.
    #[must_use]
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Applies an increment, decrement or local reset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::LookupMiss`] if the action names an unknown item.
    pub async fn apply(&self, action: &ItemAction) -> Result<()> {
        let mut table = self.table.lock().await;
        table.apply(action)
    }

    /// Clears in-memory counts without touching persisted state.
    pub async fn reset_local(&self) {
        self.table.lock().await.reset_local();
    }

    /// Copy of the current item table.
    pub async fn snapshot(&self) -> ItemTable {
        self.table.lock().await.clone()
    }

    /// Current counts with their total and equivalents.
    pub async fn live_view(&self) -> LiveView {
        let table = self.snapshot().await;
        let total_co2 = table.total_co2();

        LiveView {
            categories: table.categories().to_vec(),
            total_co2,
            equivalents: self.reconciler.equivalents(total_co2),
        }
    }

    /// Live view plus cumulative totals and ranking.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if the ledger cannot be read.
    pub async fn dashboard(&self) -> Result<DashboardView> {
        let live = self.live_view().await;
        let ledger = self.reconciler.ledger_summary().await?;
        Ok(DashboardView { live, ledger })
    }

    /// Persists the current counts as a checkout and clears them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if persistence fails; counts are kept.
    pub async fn commit(&self) -> Result<CommitOutcome> {
        let mut table = self.table.lock().await;
        self.reconciler.commit(&mut table).await
    }

    /// Archives the ledger for the given operator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if archiving fails.
    pub async fn logout(&self, user_name: Option<&str>) -> Result<LogoutOutcome> {
        let table = self.table.lock().await;
        self.reconciler.logout(user_name, table.categories()).await
    }

    /// Forces persisted counts to zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if the update fails.
    pub async fn admin_reset(&self) -> Result<()> {
        let table = self.table.lock().await;
        self.reconciler.admin_reset(table.categories()).await
    }

    /// Deletes the session ledger without archiving.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackerError::Store`] if the delete fails.
    pub async fn clear_sessions(&self) -> Result<()> {
        let _table = self.table.lock().await;
        self.reconciler.clear_sessions().await
    }
}
