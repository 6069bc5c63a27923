//! Waste records: stock written off with its cost frozen at record time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::quantity::{checked_mul, ensure_positive};
use galley_core::{DomainResult, Entity, EntityId, entity_id};

use crate::item::InventoryItemId;
use crate::ledger::StockLedger;

entity_id!(
    /// Waste record identifier.
    WasteItemId
);

/// What kind of stock was wasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteItemType {
    Inventory,
    Prep,
}

/// A recorded loss. `cost` is computed once and never re-derived from live prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteItem {
    pub id: WasteItemId,
    pub item_type: WasteItemType,
    /// Inventory item or prep item id, depending on `item_type`.
    pub item_ref: EntityId,
    pub quantity: Decimal,
    pub unit: String,
    pub reason: Option<String>,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
}

impl WasteItem {
    /// Round the frozen cost to `scale` decimal places.
    pub fn with_cost_scale(mut self, scale: u32) -> Self {
        self.cost = self.cost.round_dp(scale);
        self
    }
}

impl Entity for WasteItem {
    type Id = WasteItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Normalize an optional free-text reason (blank means none).
pub fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

/// Write off `quantity` of an inventory item.
///
/// Stock is deducted through the ledger, so wasting more than is on hand fails
/// with `InsufficientStock` and records nothing.
pub fn record_inventory_waste(
    ledger: &mut StockLedger,
    item_id: InventoryItemId,
    quantity: Decimal,
    reason: Option<String>,
    at: DateTime<Utc>,
) -> DomainResult<WasteItem> {
    ensure_positive("waste quantity", quantity)?;
    let (unit, price) = {
        let item = ledger.require(item_id)?;
        (item.unit().to_string(), item.effective_price())
    };

    let cost = checked_mul("waste cost", quantity, price)?;
    ledger.apply_delta(item_id, -quantity)?;

    Ok(WasteItem {
        id: WasteItemId::generate(),
        item_type: WasteItemType::Inventory,
        item_ref: item_id.0,
        quantity,
        unit,
        reason: normalize_reason(reason),
        cost,
        created_at: at,
    })
}
