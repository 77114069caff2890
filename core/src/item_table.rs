//! The in-memory item state table.
//!
//! This table is the authoritative view of what has been exchanged since the
//! last checkout. The document store only catches up on commit.

use crate::error::{Result, TrackerError};
use crate::types::{Category, ExchangedCategory, ExchangedItem, ExchangedItems, Item};

/// Mutations accepted by the item table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemAction {
    /// Add one unit of the named item
    Increment {
        /// Item to change
        item_name: String,
    },
    /// Remove one unit of the named item, never below zero
    Decrement {
        /// Item to change
        item_name: String,
    },
    /// Clear every count, leaving persisted state alone
    Reset,
}

impl ItemAction {
    /// Builds an action from the `action`/`item_name` form fields.
    ///
    /// Returns `None` for any action other than `increment` or `decrement`.
    #[must_use]
    pub fn parse(action: &str, item_name: &str) -> Option<Self> {
        let item_name = item_name.to_string();
        match action {
            "increment" => Some(Self::Increment { item_name }),
            "decrement" => Some(Self::Decrement { item_name }),
            _ => None,
        }
    }
}

/// Categories and their live counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemTable {
    categories: Vec<Category>,
}

impl ItemTable {
    /// Creates a table from catalog categories.
    #[must_use]
    pub const fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Categories in catalog order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// First item with this name, in category-then-item order.
    #[must_use]
    pub fn get(&self, item_name: &str) -> Option<&Item> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .find(|item| item.name == item_name)
    }

    fn find_mut(&mut self, item_name: &str) -> Result<&mut Item> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.items.iter_mut())
            .find(|item| item.name == item_name)
            .ok_or_else(|| TrackerError::LookupMiss {
                item_name: item_name.to_string(),
            })
    }

    /// Adds one unit of the named item.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::LookupMiss`] if no item has this name.
    pub fn increment(&mut self, item_name: &str) -> Result<&Item> {
        let item = self.find_mut(item_name)?;
        item.increment();
        Ok(item)
    }

    /// Removes one unit of the named item, stopping at zero.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::LookupMiss`] if no item has this name.
    pub fn decrement(&mut self, item_name: &str) -> Result<&Item> {
        let item = self.find_mut(item_name)?;
        item.decrement();
        Ok(item)
    }

    /// Clears every item's count and CO2.
    pub fn reset_local(&mut self) {
        self.categories
            .iter_mut()
            .flat_map(|c| c.items.iter_mut())
            .for_each(Item::clear);
    }

    /// Applies one action to the table.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::LookupMiss`] if the action names an unknown item.
    pub fn apply(&mut self, action: &ItemAction) -> Result<()> {
        match action {
            ItemAction::Increment { item_name } => {
                self.increment(item_name)?;
            }
            ItemAction::Decrement { item_name } => {
                self.decrement(item_name)?;
            }
            ItemAction::Reset => self.reset_local(),
        }
        Ok(())
    }

    /// Sum of CO2 over all items.
    #[must_use]
    pub fn total_co2(&self) -> f64 {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .map(Item::co2)
            .sum()
    }

    /// Snapshot of every exchanged item, grouped by category.
    ///
    /// Categories keep catalog order; those with nothing exchanged are left out.
    #[must_use]
    pub fn exchanged_items(&self) -> ExchangedItems {
        self.categories
            .iter()
            .filter_map(|category| {
                let items: Vec<ExchangedItem> = category
                    .items
                    .iter()
                    .filter(|item| item.is_exchanged())
                    .map(ExchangedItem::from)
                    .collect();
                (!items.is_empty()).then(|| ExchangedCategory {
                    category: category.name.clone(),
                    items,
                })
            })
            .collect()
    }

    /// Whether every count is zero.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .all(|item| item.count() == 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> ItemTable {
        ItemTable::new(vec![
            Category::new(
                "Cups",
                vec![Item::new("Mug", 0.5), Item::new("Bottle", 1.5)],
            ),
            Category::new("Bags", vec![Item::new("Tote", 2.0)]),
        ])
    }

    #[test]
    fn test_increment_updates_count_and_co2() {
        let mut table = table();
        table.increment("Tote").unwrap();
        table.increment("Tote").unwrap();

        let tote = table.get("Tote").unwrap();
        assert_eq!(tote.count(), 2);
        assert_eq!(tote.co2(), 4.0);
        assert_eq!(table.total_co2(), 4.0);
    }

    #[test]
    fn test_decrement_never_negative() {
        let mut table = table();
        table.decrement("Mug").unwrap();

        assert_eq!(table.get("Mug").unwrap().count(), 0);
        assert!(table.is_clear());
    }

    #[test]
    fn test_unknown_item_is_lookup_miss() {
        let mut table = table();
        let before = table.clone();

        let err = table.increment("Spork").unwrap_err();
        assert!(err.is_ignorable());
        assert_eq!(table, before);
    }

    #[test]
    fn test_first_match_wins_on_duplicate_names() {
        let mut table = ItemTable::new(vec![
            Category::new("Cups", vec![Item::new("Lid", 0.1)]),
            Category::new("Boxes", vec![Item::new("Lid", 0.2)]),
        ]);

        table.increment("Lid").unwrap();

        assert_eq!(table.categories()[0].items[0].count(), 1);
        assert_eq!(table.categories()[1].items[0].count(), 0);
    }

    #[test]
    fn test_reset_local_clears_everything() {
        let mut table = table();
        table.increment("Mug").unwrap();
        table.increment("Bottle").unwrap();

        table.apply(&ItemAction::Reset).unwrap();

        assert!(table.is_clear());
        assert_eq!(table.total_co2(), 0.0);
    }

    #[test]
    fn test_exchanged_items_only_lists_nonzero() {
        let mut table = table();
        table.increment("Bottle").unwrap();

        let exchanged = table.exchanged_items();
        assert_eq!(exchanged.len(), 1);
        assert_eq!(exchanged[0].category, "Cups");
        let cups = &exchanged[0].items;
        assert_eq!(cups.len(), 1);
        assert_eq!(cups[0].name, "Bottle");
        assert_eq!(cups[0].co2, 1.5);
    }

    #[test]
    fn test_exchanged_items_keep_catalog_order() {
        let mut table = ItemTable::new(vec![
            Category::new("Straws", vec![Item::new("Steel", 0.1)]),
            Category::new("Bags", vec![Item::new("Tote", 2.0)]),
            Category::new("Cups", vec![Item::new("Mug", 0.5)]),
        ]);
        table.increment("Mug").unwrap();
        table.increment("Steel").unwrap();
        table.increment("Tote").unwrap();

        let categories: Vec<_> = table
            .exchanged_items()
            .into_iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(categories, vec!["Straws", "Bags", "Cups"]);
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            ItemAction::parse("increment", "Mug"),
            Some(ItemAction::Increment {
                item_name: "Mug".to_string()
            })
        );
        assert_eq!(
            ItemAction::parse("decrement", "Mug"),
            Some(ItemAction::Decrement {
                item_name: "Mug".to_string()
            })
        );
        assert_eq!(ItemAction::parse("explode", "Mug"), None);
    }

    proptest! {
        #[test]
        fn prop_invariant_holds_after_any_sequence(ops in proptest::collection::vec((0u8..3, 0usize..4), 0..64)) {
            let names = ["Mug", "Bottle", "Tote", "Spork"];
            let mut table = table();

            for (op, idx) in ops {
                let name = names[idx];
                let _ = match op {
                    0 => table.apply(&ItemAction::Increment { item_name: name.to_string() }),
                    1 => table.apply(&ItemAction::Decrement { item_name: name.to_string() }),
                    _ => table.apply(&ItemAction::Reset),
                };

                for item in table.categories().iter().flat_map(|c| c.items.iter()) {
                    prop_assert_eq!(item.co2(), f64::from(item.count()) * item.base_co2);
                }
            }
        }

        #[test]
        fn prop_increment_then_decrement_round_trips(start in 0u32..50) {
            let mut table = table();
            for _ in 0..start {
                table.increment("Bottle").unwrap();
            }
            let before = table.get("Bottle").cloned().unwrap();

            table.increment("Bottle").unwrap();
            table.decrement("Bottle").unwrap();

            prop_assert_eq!(table.get("Bottle").cloned().unwrap(), before);
        }
    }
}
