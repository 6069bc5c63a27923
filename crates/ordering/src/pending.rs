//! The pending ("current") order: at most one line per inventory item.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::quantity::{
    checked_add, checked_mul, checked_sum, ensure_non_negative, ensure_positive, ensure_unit,
};
use galley_core::{DomainError, DomainResult, Entity, entity_id};
use galley_inventory::InventoryItemId;

use crate::suggest::{ReorderPrice, SuggestedItem};

entity_id!(
    /// Pending order line identifier.
    OrderLineId
);

/// Line status. Lines only exist while un-ordered, so this is always `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderLineStatus {
    #[default]
    Pending,
}

/// A line in the pending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: OrderLineId,
    pub item_id: InventoryItemId,
    pub quantity: Decimal,
    pub unit: String,
    pub price_per_unit: Decimal,
    /// Always `quantity * price_per_unit`.
    pub total_price: Decimal,
    pub status: OrderLineStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderLineItem {
    fn set_amounts(
        &mut self,
        quantity: Decimal,
        price_per_unit: Decimal,
        total_price: Decimal,
        at: DateTime<Utc>,
    ) {
        self.quantity = quantity;
        self.price_per_unit = price_per_unit;
        self.total_price = total_price;
        self.updated_at = at;
    }
}

fn line_total(quantity: Decimal, price_per_unit: Decimal) -> DomainResult<Decimal> {
    checked_mul("total_price", quantity, price_per_unit)
}

impl Entity for OrderLineItem {
    type Id = OrderLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Request to put an item on the pending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_id: InventoryItemId,
    pub unit: String,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
}

impl LineRequest {
    pub fn new(
        item_id: InventoryItemId,
        unit: impl Into<String>,
        quantity: Decimal,
        price_per_unit: Decimal,
    ) -> Self {
        Self {
            item_id,
            unit: unit.into(),
            quantity,
            price_per_unit,
        }
    }

    fn validated(&self) -> DomainResult<(String, Decimal, Decimal)> {
        let unit = ensure_unit(&self.unit)?;
        let quantity = ensure_positive("quantity", self.quantity)?;
        let price = ensure_non_negative("price_per_unit", self.price_per_unit)?;
        Ok((unit, quantity, price))
    }
}

/// Aggregator for one actor's pending order.
///
/// Manual edits (`add_or_update`, `update_line`) replace quantity and price;
/// automatic top-ups (`increment_for_reorder`) add to the existing quantity.
/// Both overwrite the price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingOrder {
    lines: Vec<OrderLineItem>,
}

impl PendingOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted lines. Later lines for an already-seen item are
    /// folded into the first one to restore the one-line-per-item invariant: the
    /// first line's id is kept, quantities are summed and the later line's price
    /// wins, as with any other price overwrite.
    ///
    /// Fails when the merged amounts overflow.
    pub fn from_lines(lines: impl IntoIterator<Item = OrderLineItem>) -> DomainResult<Self> {
        let mut order = Self::new();
        for line in lines {
            match order.position_of_item(line.item_id) {
                Some(idx) => {
                    let existing = &mut order.lines[idx];
                    let quantity = checked_add("quantity", existing.quantity, line.quantity)?;
                    let total = line_total(quantity, line.price_per_unit)?;
                    let updated_at = existing.updated_at.max(line.updated_at);
                    existing.set_amounts(quantity, line.price_per_unit, total, updated_at);
                }
                None => order.lines.push(line),
            }
        }
        order.order_total(None, Decimal::ZERO)?;
        Ok(order)
    }

    pub fn lines(&self) -> &[OrderLineItem] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, line_id: OrderLineId) -> Option<&OrderLineItem> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn line_for_item(&self, item_id: InventoryItemId) -> Option<&OrderLineItem> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Insert a line, or replace the quantity and price of the item's existing line.
    pub fn add_or_update(
        &mut self,
        request: &LineRequest,
        at: DateTime<Utc>,
    ) -> DomainResult<OrderLineItem> {
        let (unit, quantity, price) = request.validated()?;
        self.upsert(request.item_id, unit, at, |_| Ok(quantity), price)
    }

    /// Add `request.quantity` on top of the item's existing line (or insert one).
    pub fn increment_for_reorder(
        &mut self,
        request: &LineRequest,
        at: DateTime<Utc>,
    ) -> DomainResult<OrderLineItem> {
        let (unit, delta, price) = request.validated()?;
        self.upsert(
            request.item_id,
            unit,
            at,
            |existing| checked_add("quantity", existing.unwrap_or(Decimal::ZERO), delta),
            price,
        )
    }

    /// Edit a line by its own id (replace semantics).
    pub fn update_line(
        &mut self,
        line_id: OrderLineId,
        quantity: Decimal,
        price_per_unit: Decimal,
        at: DateTime<Utc>,
    ) -> DomainResult<OrderLineItem> {
        let quantity = ensure_positive("quantity", quantity)?;
        let price = ensure_non_negative("price_per_unit", price_per_unit)?;
        let idx = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| DomainError::not_found(format!("order line {line_id}")))?;
        let total = line_total(quantity, price)?;
        self.order_total(Some(idx), total)?;

        let line = &mut self.lines[idx];
        line.set_amounts(quantity, price, total, at);
        Ok(line.clone())
    }

    /// Remove a line. Absent lines are a no-op.
    pub fn remove(&mut self, line_id: OrderLineId) -> Option<OrderLineItem> {
        let idx = self.lines.iter().position(|l| l.id == line_id)?;
        Some(self.lines.remove(idx))
    }

    /// Sum of line totals, recomputed on every call.
    ///
    /// Every write checks that this sum stays representable.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.total_price).sum()
    }

    /// Put every suggestion's shortfall on the order (replace semantics per item).
    ///
    /// All requests are validated before the first line is touched.
    pub fn fill_from_suggestions(
        &mut self,
        suggestions: &[SuggestedItem],
        policy: ReorderPrice,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<OrderLineItem>> {
        let requests: Vec<LineRequest> = suggestions
            .iter()
            .filter(|s| s.stock_difference > Decimal::ZERO)
            .map(|s| LineRequest::new(s.item_id, s.unit.clone(), s.stock_difference, s.price(policy)))
            .collect();

        for r in &requests {
            r.validated()?;
        }

        let mut staged = self.clone();
        let lines = requests
            .iter()
            .map(|r| staged.add_or_update(r, at))
            .collect::<DomainResult<Vec<_>>>()?;
        *self = staged;
        Ok(lines)
    }

    /// Remove and return every line.
    pub fn clear(&mut self) -> Vec<OrderLineItem> {
        std::mem::take(&mut self.lines)
    }

    fn position_of_item(&self, item_id: InventoryItemId) -> Option<usize> {
        self.lines.iter().position(|l| l.item_id == item_id)
    }

    fn upsert(
        &mut self,
        item_id: InventoryItemId,
        unit: String,
        at: DateTime<Utc>,
        quantity: impl FnOnce(Option<Decimal>) -> DomainResult<Decimal>,
        price: Decimal,
    ) -> DomainResult<OrderLineItem> {
        let idx = self.position_of_item(item_id);
        let q = quantity(idx.map(|i| self.lines[i].quantity))?;
        let total = line_total(q, price)?;
        self.order_total(idx, total)?;

        match idx {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.unit = unit;
                line.set_amounts(q, price, total, at);
                Ok(line.clone())
            }
            None => {
                let line = OrderLineItem {
                    id: OrderLineId::generate(),
                    item_id,
                    quantity: q,
                    unit,
                    price_per_unit: price,
                    total_price: total,
                    status: OrderLineStatus::Pending,
                    created_at: at,
                    updated_at: at,
                };
                self.lines.push(line.clone());
                Ok(line)
            }
        }
    }

    /// Order total with the line at `replacing` (if any) swapped for `line_total`.
    fn order_total(&self, replacing: Option<usize>, line_total: Decimal) -> DomainResult<Decimal> {
        let others = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != replacing)
            .map(|(_, l)| l.total_price);
        checked_sum("order total", others.chain(std::iter::once(line_total)))
    }
}
