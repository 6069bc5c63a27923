//! Recipe costing and prep waste.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use galley_core::quantity::{checked_mul, checked_sum, ensure_positive};
use galley_core::{DomainError, DomainResult};
use galley_inventory::{StockLedger, WasteItem, WasteItemId, WasteItemType, normalize_reason};

use crate::item::PrepItem;

/// Cost of one unit of prep yield at current ingredient prices.
pub fn unit_cost(prep: &PrepItem, ledger: &StockLedger) -> DomainResult<Decimal> {
    let costs = prep
        .ingredients()
        .iter()
        .map(|ingredient| {
            let item = ledger.require(ingredient.item_id)?;
            checked_mul("unit cost", ingredient.quantity_per_yield, item.effective_price())
        })
        .collect::<DomainResult<Vec<_>>>()?;
    checked_sum("unit cost", costs)
}

/// Write off `quantity` of a prep item.
///
/// The cost is taken from current ingredient prices and frozen on the record.
/// Prep stock is reduced and its status recomputed; wasting more than is on
/// hand is rejected and records nothing.
pub fn record_prep_waste(
    prep: &mut PrepItem,
    quantity: Decimal,
    reason: Option<String>,
    ledger: &StockLedger,
    at: DateTime<Utc>,
) -> DomainResult<WasteItem> {
    ensure_positive("waste quantity", quantity)?;
    let available = prep.current_stock();
    if quantity > available {
        return Err(DomainError::insufficient_stock(
            prep.id_typed().0,
            prep.name(),
            quantity,
            available,
        ));
    }
    let cost = checked_mul("waste cost", quantity, unit_cost(prep, ledger)?)?;

    prep.write_stock(available - quantity);

    Ok(WasteItem {
        id: WasteItemId::generate(),
        item_type: WasteItemType::Prep,
        item_ref: prep.id_typed().0,
        quantity,
        unit: prep.yield_unit().to_string(),
        reason: normalize_reason(reason),
        cost,
        created_at: at,
    })
}
