//! Domain types for the CO2 exchange tracker.
//!
//! Items live inside categories. An item's `co2` is always derived from its
//! `count` and its fixed `base_co2`, so the two private fields can only be
//! changed through methods that keep `co2 == count * base_co2`.

use crate::equivalents::Equivalents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable item that visitors can exchange.
///
/// Items are built from the catalog and never deserialized; `count` and
/// `co2` change only through the methods below.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Item {
    /// Display name, unique within its category
    pub name: String,
    /// CO2 saved per exchanged unit, in kilograms
    pub base_co2: f64,
    count: u32,
    co2: f64,
}

impl Item {
    /// Creates an item with a zero count.
    ///
    /// A negative, infinite or NaN `base_co2` is replaced by zero so that
    /// `co2` stays a non-negative number.
    #[must_use]
    pub fn new(name: impl Into<String>, base_co2: f64) -> Self {
        let name = name.into();
        let base_co2 = if base_co2.is_finite() && base_co2 >= 0.0 {
            base_co2
        } else {
            tracing::warn!(item = %name, base_co2, "Invalid base CO2; using 0");
            0.0
        };

        Self {
            name,
            base_co2,
            count: 0,
            co2: 0.0,
        }
    }

    /// Creates an item with the given count, deriving its CO2.
    #[must_use]
    pub fn with_count(name: impl Into<String>, base_co2: f64, count: u32) -> Self {
        let mut item = Self::new(name, base_co2);
        item.set_count(count);
        item
    }

    /// Number of units exchanged since the last reset.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// CO2 saved by the current count, in kilograms.
    #[must_use]
    pub const fn co2(&self) -> f64 {
        self.co2
    }

    /// Sets the count and recomputes CO2.
    pub fn set_count(&mut self, count: u32) {
        self.count = count;
        self.co2 = f64::from(count) * self.base_co2;
    }

    /// Adds one unit.
    pub fn increment(&mut self) {
        self.set_count(self.count.saturating_add(1));
    }

    /// Removes one unit, stopping at zero.
    pub fn decrement(&mut self) {
        self.set_count(self.count.saturating_sub(1));
    }

    /// Clears count and CO2.
    pub fn clear(&mut self) {
        self.set_count(0);
    }

    /// Whether this item belongs in a checkout snapshot.
    #[must_use]
    pub fn is_exchanged(&self) -> bool {
        self.count > 0 || self.co2 > 0.0
    }
}

/// An ordered group of items.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Category {
    /// Category name
    pub name: String,
    /// Items in catalog order
    pub items: Vec<Item>,
}

impl Category {
    /// Creates a category from its items.
    #[must_use]
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

/// One line of a checkout snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangedItem {
    /// Item name
    pub name: String,
    /// Units exchanged
    pub count: u32,
    /// CO2 saved, in kilograms
    pub co2: f64,
}

impl From<&Item> for ExchangedItem {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            count: item.count(),
            co2: item.co2(),
        }
    }
}

/// Exchanged items of one category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangedCategory {
    /// Category name
    pub category: String,
    /// Exchanged items in catalog order
    pub items: Vec<ExchangedItem>,
}

/// Exchanged items grouped by category, in catalog order.
pub type ExchangedItems = Vec<ExchangedCategory>;

/// A persisted checkout with a strictly positive CO2 total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Total CO2 saved by the checkout, in kilograms
    pub total_co2: f64,
    /// Human-relatable equivalents of `total_co2`
    pub equivalents: Equivalents,
    /// Snapshot of the non-zero items
    pub exchanged_items: ExchangedItems,
    /// When the checkout was committed
    pub recorded_at: DateTime<Utc>,
}

/// Persisted state of a single item, as held by the document store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    /// Item name
    pub name: String,
    /// Last committed count
    pub count: u32,
    /// Last committed CO2, in kilograms
    pub co2: f64,
    /// CO2 per unit, in kilograms
    pub base_co2: f64,
}

/// Persisted items of one category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredCategory {
    /// Category name
    pub category: String,
    /// Items in catalog order
    pub items: Vec<StoredItem>,
}

/// One entry of the popularity ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    /// Category the item belongs to
    pub category: String,
    /// Item name
    pub name: String,
    /// Committed count
    pub count: u32,
    /// Committed CO2, in kilograms
    pub co2: f64,
}

/// Flattens per-category documents into one category-major sequence.
#[must_use]
pub fn flatten_stored(categories: &[StoredCategory]) -> Vec<RankedItem> {
    categories
        .iter()
        .flat_map(|category| {
            category.items.iter().map(|item| RankedItem {
                category: category.category.clone(),
                name: item.name.clone(),
                count: item.count,
                co2: item.co2,
            })
        })
        .collect()
}

/// Sorts items by count, most exchanged first.
///
/// The sort is stable: items with equal counts keep their input order.
#[must_use]
pub fn rank_by_count(mut items: Vec<RankedItem>) -> Vec<RankedItem> {
    items.sort_by(|a, b| b.count.cmp(&a.count));
    items
}

/// Running totals over every session recorded since the last logout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeTotals {
    /// Sum of the sessions' CO2 totals, in kilograms
    pub total_co2: f64,
    /// Sum of the sessions' stored equivalents
    pub equivalents: Equivalents,
    /// Number of sessions folded
    pub session_count: usize,
}

impl CumulativeTotals {
    /// Folds all session records into running totals.
    #[must_use]
    pub fn fold(sessions: &[SessionRecord]) -> Self {
        sessions.iter().fold(Self::default(), |mut acc, session| {
            acc.total_co2 += session.total_co2;
            acc.equivalents = acc.equivalents + session.equivalents;
            acc.session_count += 1;
            acc
        })
    }

    /// Phase of the ledger implied by these totals.
    #[must_use]
    pub const fn phase(&self) -> LedgerPhase {
        if self.session_count > 0 {
            LedgerPhase::CommittedPendingArchive
        } else {
            LedgerPhase::Idle
        }
    }
}

/// Where the session ledger stands between two logouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPhase {
    /// No session recorded since the last logout
    Idle,
    /// At least one checkout is waiting to be archived
    CommittedPendingArchive,
}

/// Folded summary written when an operator logs out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Operator name from the identity cookie, if any
    pub user_name: Option<String>,
    /// Number of sessions archived
    pub session_count: usize,
    /// Persisted items ranked by count
    pub sorted_items: Vec<RankedItem>,
    /// Totals over the archived sessions
    pub totals: CumulativeTotals,
    /// When the archive entry was written
    pub archived_at: DateTime<Utc>,
}
