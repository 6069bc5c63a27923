//! Stock ledger: the single mutation path for inventory stock.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use galley_core::quantity::{checked_add, ensure_non_negative};
use galley_core::{DomainError, DomainResult};

use crate::item::{InventoryItem, InventoryItemId};

/// In-memory view of one actor's inventory.
///
/// Reads are free; every stock change goes through [`StockLedger::apply_delta`]
/// (or its all-or-nothing batch form). Items whose stock changed are remembered
/// so callers can persist exactly those.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLedger {
    items: BTreeMap<InventoryItemId, InventoryItem>,
    changed: BTreeSet<InventoryItemId>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id_typed(), i)).collect(),
            changed: BTreeSet::new(),
        }
    }

    /// Register or replace an item. Does not mark it as changed.
    pub fn insert(&mut self, item: InventoryItem) {
        self.items.insert(item.id_typed(), item);
    }

    pub fn get(&self, id: InventoryItemId) -> Option<&InventoryItem> {
        self.items.get(&id)
    }

    pub fn require(&self, id: InventoryItemId) -> DomainResult<&InventoryItem> {
        self.items
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("inventory item {id}")))
    }

    pub fn items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_below_par(&self, id: InventoryItemId) -> DomainResult<bool> {
        Ok(self.require(id)?.is_below_par())
    }

    /// Current stock, treating an untracked item as holding nothing.
    pub fn available(&self, id: InventoryItemId) -> DomainResult<Decimal> {
        Ok(self.require(id)?.current_stock().unwrap_or(Decimal::ZERO))
    }

    /// Add `delta` (possibly negative) to an item's stock and return the new value.
    ///
    /// Fails with `InsufficientStock` when the result would drop below zero; the
    /// item is left untouched in that case.
    pub fn apply_delta(&mut self, id: InventoryItemId, delta: Decimal) -> DomainResult<Decimal> {
        let new_stock = self.checked_stock(id, delta)?;
        self.write_stock(id, new_stock);
        Ok(new_stock)
    }

    /// Apply several deltas as one unit.
    ///
    /// Deltas for the same item are summed before checking, and nothing is
    /// written unless every item stays non-negative.
    pub fn apply_deltas(
        &mut self,
        deltas: &[(InventoryItemId, Decimal)],
    ) -> DomainResult<Vec<(InventoryItemId, Decimal)>> {
        let mut combined: BTreeMap<InventoryItemId, Decimal> = BTreeMap::new();
        let mut order = Vec::new();
        for (id, delta) in deltas {
            let entry = combined.entry(*id).or_insert_with(|| {
                order.push(*id);
                Decimal::ZERO
            });
            *entry = checked_add("stock delta", *entry, *delta)?;
        }

        let mut planned = Vec::with_capacity(order.len());
        for id in order {
            let new_stock = self.checked_stock(id, combined[&id])?;
            planned.push((id, new_stock));
        }

        for (id, new_stock) in &planned {
            self.write_stock(*id, *new_stock);
        }
        Ok(planned)
    }

    /// Direct inventory edit (count correction). Routed through `apply_delta`.
    pub fn set_stock(&mut self, id: InventoryItemId, value: Decimal) -> DomainResult<Decimal> {
        ensure_non_negative("current_stock", value)?;
        let current = self.available(id)?;
        self.apply_delta(id, value - current)
    }

    /// Ids whose stock changed since construction (or the last `take_changed`).
    pub fn take_changed(&mut self) -> Vec<InventoryItemId> {
        std::mem::take(&mut self.changed).into_iter().collect()
    }

    pub fn into_items(self) -> Vec<InventoryItem> {
        self.items.into_values().collect()
    }

    fn checked_stock(&self, id: InventoryItemId, delta: Decimal) -> DomainResult<Decimal> {
        let item = self.require(id)?;
        let current = item.current_stock().unwrap_or(Decimal::ZERO);
        let new_stock = checked_add("current_stock", current, delta)?;
        if new_stock < Decimal::ZERO {
            return Err(DomainError::insufficient_stock(
                id.0,
                item.name(),
                -delta,
                current,
            ));
        }
        Ok(new_stock)
    }

    fn write_stock(&mut self, id: InventoryItemId, stock: Decimal) {
        if let Some(item) = self.items.get_mut(&id) {
            item.set_current_stock(stock);
            self.changed.insert(id);
        }
    }
}
