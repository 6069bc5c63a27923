//! Reorder suggestions ranked by how far below par each item is.

use core::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_inventory::{InventoryItem, InventoryItemId};

/// Three fixed urgency tiers. The numeric level (1..=3) is what the UI colours on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Urgency {
    /// `High` at or below 25% of par, `Medium` at or below 50%, otherwise `Low`.
    pub fn from_percentage(stock_percentage: Decimal) -> Self {
        if stock_percentage <= Decimal::from(25) {
            Urgency::High
        } else if stock_percentage <= Decimal::from(50) {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }
}

/// One reorder candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedItem {
    pub item_id: InventoryItemId,
    pub name: String,
    pub unit: String,
    pub current_stock: Decimal,
    pub par_level: Decimal,
    /// `max(0, par_level - current_stock)`.
    pub stock_difference: Decimal,
    /// `current_stock / par_level * 100`, or 100 when par is zero.
    pub stock_percentage: Decimal,
    pub urgency: Urgency,
    pub last_price: Option<Decimal>,
    pub default_price: Option<Decimal>,
}

impl SuggestedItem {
    /// Unit price to use when this suggestion is added to the pending order.
    pub fn price(&self, policy: ReorderPrice) -> Decimal {
        policy.pick(self.last_price, self.default_price)
    }
}

/// Which stored price the engine uses for lines it creates on its own
/// (suggestion fill, shortfall top-up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderPrice {
    /// Last paid price, falling back to the list price.
    #[default]
    LastPaid,
    /// List price only.
    ListPrice,
}

impl ReorderPrice {
    pub fn pick(self, last_price: Option<Decimal>, default_price: Option<Decimal>) -> Decimal {
        match self {
            ReorderPrice::LastPaid => last_price.or(default_price),
            ReorderPrice::ListPrice => default_price,
        }
        .unwrap_or(Decimal::ZERO)
    }

    pub fn price_of(self, item: &InventoryItem) -> Decimal {
        self.pick(item.last_price(), item.default_price())
    }
}

impl SuggestedItem {
    fn from_item(item: &InventoryItem, current_stock: Decimal, par_level: Decimal) -> Self {
        let stock_percentage = if par_level > Decimal::ZERO {
            current_stock / par_level * Decimal::ONE_HUNDRED
        } else {
            Decimal::ONE_HUNDRED
        };
        let stock_difference = (par_level - current_stock).max(Decimal::ZERO);

        Self {
            item_id: item.id_typed(),
            name: item.name().to_string(),
            unit: item.unit().to_string(),
            current_stock,
            par_level,
            stock_difference,
            stock_percentage,
            urgency: Urgency::from_percentage(stock_percentage),
            last_price: item.last_price(),
            default_price: item.default_price(),
        }
    }
}

/// Compute the ranked reorder list from a snapshot of inventory.
///
/// Only tracked items strictly below par are included. Results are ordered by
/// urgency (most urgent first), then by case-folded name, with exact name and id
/// as final tie-breaks so identical input always yields identical output.
pub fn compute_suggestions<'a>(
    items: impl IntoIterator<Item = &'a InventoryItem>,
) -> Vec<SuggestedItem> {
    let mut suggestions: Vec<SuggestedItem> = items
        .into_iter()
        .filter_map(|item| match (item.current_stock(), item.par_level()) {
            (Some(stock), Some(par)) if stock < par => {
                Some(SuggestedItem::from_item(item, stock, par))
            }
            _ => None,
        })
        .collect();

    suggestions.sort_by(rank);
    suggestions
}

fn rank(a: &SuggestedItem, b: &SuggestedItem) -> Ordering {
    b.urgency
        .cmp(&a.urgency)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_inventory::{CategoryId, NewInventoryItem};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(name: &str, stock: Option<Decimal>, par: Option<Decimal>) -> InventoryItem {
        InventoryItem::new(NewInventoryItem {
            id: InventoryItemId::generate(),
            name: name.to_string(),
            unit: "ea".to_string(),
            current_stock: stock,
            par_level: par,
            default_price: Some(dec!(1.50)),
            last_price: None,
            category_id: CategoryId::generate(),
            vendor_id: None,
            is_custom: false,
        })
        .unwrap()
    }

    #[test]
    fn urgency_tiers_are_inclusive_at_the_boundaries() {
        assert_eq!(Urgency::from_percentage(dec!(0)), Urgency::High);
        assert_eq!(Urgency::from_percentage(dec!(25)), Urgency::High);
        assert_eq!(Urgency::from_percentage(dec!(25.01)), Urgency::Medium);
        assert_eq!(Urgency::from_percentage(dec!(50)), Urgency::Medium);
        assert_eq!(Urgency::from_percentage(dec!(50.5)), Urgency::Low);
        assert_eq!(Urgency::High.level(), 3);
        assert_eq!(Urgency::Low.level(), 1);
    }

    #[test]
    fn reorder_price_policy() {
        assert_eq!(ReorderPrice::LastPaid.pick(Some(dec!(2)), Some(dec!(3))), dec!(2));
        assert_eq!(ReorderPrice::LastPaid.pick(None, Some(dec!(3))), dec!(3));
        assert_eq!(ReorderPrice::ListPrice.pick(Some(dec!(2)), None), Decimal::ZERO);
    }

    #[test]
    fn only_tracked_items_below_par_are_suggested() {
        let items = vec![
            item("Basil", Some(dec!(1)), Some(dec!(4))),
            item("Thyme", Some(dec!(4)), Some(dec!(4))),
            item("Sage", None, Some(dec!(4))),
            item("Dill", Some(dec!(0)), None),
            item("Mint", Some(dec!(0)), Some(dec!(0))),
        ];

        let suggestions = compute_suggestions(&items);
        assert_eq!(suggestions.len(), 1);
        let s = &suggestions[0];
        assert_eq!(s.name, "Basil");
        assert_eq!(s.stock_difference, dec!(3));
        assert_eq!(s.stock_percentage, dec!(25));
        assert_eq!(s.urgency, Urgency::High);
        assert_eq!(s.unit, "ea");
    }

    #[test]
    fn ranked_by_urgency_then_case_insensitive_name() {
        let items = vec![
            item("zucchini", Some(dec!(9)), Some(dec!(10))), // 90% -> low
            item("Apples", Some(dec!(4)), Some(dec!(10))),   // 40% -> medium
            item("bananas", Some(dec!(1)), Some(dec!(10))),  // 10% -> high
            item("Avocado", Some(dec!(2)), Some(dec!(10))),  // 20% -> high
            item("apricots", Some(dec!(8)), Some(dec!(10))), // 80% -> low
        ];

        let names: Vec<_> = compute_suggestions(&items)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            vec!["Avocado", "bananas", "Apples", "apricots", "zucchini"]
        );
    }

    #[test]
    fn ordering_is_stable_across_calls_and_input_order() {
        let mut items = vec![
            item("Leeks", Some(dec!(1)), Some(dec!(10))),
            item("leeks", Some(dec!(1)), Some(dec!(10))),
            item("Kale", Some(dec!(3)), Some(dec!(10))),
        ];
        let first = compute_suggestions(&items);
        items.reverse();
        let second = compute_suggestions(&items);
        assert_eq!(first, second);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every below-par item appears exactly once with the documented
        /// arithmetic, and the list respects urgency-then-name ordering.
        #[test]
        fn suggestions_match_formula_and_order(
            stocks in prop::collection::vec((0i64..500, 1i64..500), 0..30)
        ) {
            let items: Vec<InventoryItem> = stocks
                .iter()
                .enumerate()
                .map(|(i, (s, p))| item(&format!("item-{i:02}"), Some(Decimal::new(*s, 1)), Some(Decimal::new(*p, 1))))
                .collect();

            let suggestions = compute_suggestions(&items);
            let expected = items.iter().filter(|i| i.is_below_par()).count();
            prop_assert_eq!(suggestions.len(), expected);

            for s in &suggestions {
                prop_assert_eq!(s.stock_difference, s.par_level - s.current_stock);
                prop_assert_eq!(s.stock_percentage, s.current_stock / s.par_level * Decimal::ONE_HUNDRED);
            }

            for pair in suggestions.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.urgency >= b.urgency);
                if a.urgency == b.urgency {
                    prop_assert!(a.name.to_lowercase() <= b.name.to_lowercase());
                }
            }

            prop_assert_eq!(compute_suggestions(&items), suggestions);
        }
    }
}
