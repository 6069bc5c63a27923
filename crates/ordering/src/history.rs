//! Completed orders: immutable snapshots of the pending order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::quantity::checked_sum;
use galley_core::{DomainError, DomainResult, Entity, entity_id};
use galley_inventory::InventoryItemId;

use crate::pending::{OrderLineItem, PendingOrder};

entity_id!(
    /// Completed order identifier.
    OrderId
);

/// Snapshot of one pending line at completion time.
///
/// Holds a reference to the inventory item, never a copy of its live fields, so
/// later price edits cannot rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistoryLine {
    pub item_id: InventoryItemId,
    pub quantity: Decimal,
    pub unit: String,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
}

impl From<&OrderLineItem> for OrderHistoryLine {
    fn from(line: &OrderLineItem) -> Self {
        Self {
            item_id: line.item_id,
            quantity: line.quantity,
            unit: line.unit.clone(),
            price_per_unit: line.price_per_unit,
            total_price: line.total_price,
        }
    }
}

/// A completed (historical) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    completed_at: DateTime<Utc>,
    total_amount: Decimal,
    lines: Vec<OrderHistoryLine>,
}

impl Order {
    /// Build the historical record for `lines` without touching them.
    ///
    /// Fails with `EmptyOrder` when there is nothing to complete.
    pub fn snapshot(
        id: OrderId,
        lines: &[OrderLineItem],
        completed_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        let lines: Vec<OrderHistoryLine> = lines.iter().map(OrderHistoryLine::from).collect();
        let total_amount = checked_sum("total_amount", lines.iter().map(|l| l.total_price))?;

        Ok(Self {
            id,
            completed_at,
            total_amount,
            lines,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn lines(&self) -> &[OrderHistoryLine] {
        &self.lines
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Complete an in-memory pending order: snapshot first, clear second.
///
/// Persistent callers should use [`Order::snapshot`], confirm the write, and only
/// then clear their stored lines.
pub fn complete_order(pending: &mut PendingOrder, completed_at: DateTime<Utc>) -> DomainResult<Order> {
    let order = Order::snapshot(OrderId::generate(), pending.lines(), completed_at)?;
    pending.clear();
    Ok(order)
}
