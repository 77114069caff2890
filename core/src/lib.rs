//! # CO2 Tracker Core
//!
//! Item state, equivalence calculation and session reconciliation for a
//! reusable-item exchange at an event.
//!
//! ## Core Concepts
//!
//! - **Item State Table**: live counts per item, mutated by every
//!   increment/decrement ([`ItemTable`])
//! - **Session Ledger**: persisted checkouts since the last logout
//!   ([`SessionRecord`])
//! - **Logout Archive**: one folded entry per logout ([`ArchiveEntry`])
//! - **Equivalents**: CO2 expressed as car/bus/plane distances
//!   ([`EquivalenceFactors`])
//! - **Reconciler**: moves state between the table and the stores
//!   ([`Reconciler`])
//!
//! ## Example
//!
//! ```no_run
//! use co2_tracker_core::{
//!     environment::SystemClock, DocumentStore, EquivalenceFactors, ItemAction, Reconciler,
//!     TrackerService, CatalogStore,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     catalog: Arc<dyn CatalogStore>,
//! #     documents: Arc<dyn DocumentStore>,
//! # ) -> Result<(), co2_tracker_core::TrackerError> {
//! let reconciler = Reconciler::new(documents, Arc::new(SystemClock), EquivalenceFactors::default());
//! let service = TrackerService::load(catalog.as_ref(), reconciler).await?;
//!
//! service
//!     .apply(&ItemAction::Increment { item_name: "Mug".to_string() })
//!     .await?;
//! let outcome = service.commit().await?;
//! println!("Recorded session: {}", outcome.session.is_some());
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod equivalents;
pub mod error;
pub mod item_table;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use equivalents::{equivalents, EquivalenceFactors, Equivalents};
pub use error::{Result, StoreError, TrackerError};
pub use item_table::{ItemAction, ItemTable};
pub use reconcile::{CommitOutcome, LedgerSummary, LogoutOutcome, Reconciler};
pub use service::{DashboardView, LiveView, TrackerService};
pub use store::{CatalogStore, CheckoutBatch, DocumentStore, ItemUpdate, StoreFuture};
pub use types::{
    flatten_stored, rank_by_count, ArchiveEntry, Category, CumulativeTotals, ExchangedCategory,
    ExchangedItem,
    ExchangedItems, Item, LedgerPhase, RankedItem, SessionRecord, StoredCategory, StoredItem,
};
