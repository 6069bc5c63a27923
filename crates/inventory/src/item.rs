use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::quantity::{ensure_non_negative, ensure_unit};
use galley_core::{DomainError, DomainResult, Entity, entity_id};

entity_id!(
    /// Inventory item identifier (actor-scoped by the store that holds the item).
    InventoryItemId
);

entity_id!(
    /// Category an inventory item is filed under.
    CategoryId
);

entity_id!(
    /// Vendor an inventory item is bought from.
    VendorId
);

/// Fields required to register a new inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    pub unit: String,
    pub current_stock: Option<Decimal>,
    pub par_level: Option<Decimal>,
    pub default_price: Option<Decimal>,
    pub last_price: Option<Decimal>,
    pub category_id: CategoryId,
    pub vendor_id: Option<VendorId>,
    pub is_custom: bool,
}

/// A raw, purchasable item tracked in the stock ledger.
///
/// `current_stock` and `par_level` are optional: an item missing either is
/// "not tracked" and never shows up as a reorder candidate. Stock is only ever
/// changed through [`crate::StockLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: InventoryItemId,
    name: String,
    unit: String,
    current_stock: Option<Decimal>,
    par_level: Option<Decimal>,
    default_price: Option<Decimal>,
    last_price: Option<Decimal>,
    category_id: CategoryId,
    vendor_id: Option<VendorId>,
    is_custom: bool,
}

impl InventoryItem {
    pub fn new(new: NewInventoryItem) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let unit = ensure_unit(&new.unit)?;
        if let Some(stock) = new.current_stock {
            ensure_non_negative("current_stock", stock)?;
        }
        if let Some(par) = new.par_level {
            ensure_non_negative("par_level", par)?;
        }
        if let Some(price) = new.default_price {
            ensure_non_negative("default_price", price)?;
        }
        if let Some(price) = new.last_price {
            ensure_non_negative("last_price", price)?;
        }

        Ok(Self {
            id: new.id,
            name: new.name.trim().to_string(),
            unit,
            current_stock: new.current_stock,
            par_level: new.par_level,
            default_price: new.default_price,
            last_price: new.last_price,
            category_id: new.category_id,
            vendor_id: new.vendor_id,
            is_custom: new.is_custom,
        })
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn current_stock(&self) -> Option<Decimal> {
        self.current_stock
    }

    pub fn par_level(&self) -> Option<Decimal> {
        self.par_level
    }

    pub fn default_price(&self) -> Option<Decimal> {
        self.default_price
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn vendor_id(&self) -> Option<VendorId> {
        self.vendor_id
    }

    pub fn is_custom(&self) -> bool {
        self.is_custom
    }

    /// Both stock and par are known.
    pub fn is_tracked(&self) -> bool {
        self.current_stock.is_some() && self.par_level.is_some()
    }

    /// True iff the item is tracked and `current_stock < par_level`.
    pub fn is_below_par(&self) -> bool {
        match (self.current_stock, self.par_level) {
            (Some(stock), Some(par)) => stock < par,
            _ => false,
        }
    }

    /// Price used for costing and automatic order lines: last paid, then list, then zero.
    pub fn effective_price(&self) -> Decimal {
        self.last_price
            .or(self.default_price)
            .unwrap_or(Decimal::ZERO)
    }

    /// Record the price most recently paid for this item.
    pub fn set_last_price(&mut self, price: Decimal) -> DomainResult<()> {
        self.last_price = Some(ensure_non_negative("last_price", price)?);
        Ok(())
    }

    pub fn set_default_price(&mut self, price: Option<Decimal>) -> DomainResult<()> {
        if let Some(p) = price {
            ensure_non_negative("default_price", p)?;
        }
        self.default_price = price;
        Ok(())
    }

    /// `None` stops tracking the item.
    pub fn set_par_level(&mut self, par_level: Option<Decimal>) -> DomainResult<()> {
        if let Some(par) = par_level {
            ensure_non_negative("par_level", par)?;
        }
        self.par_level = par_level;
        Ok(())
    }

    pub(crate) fn set_current_stock(&mut self, stock: Decimal) {
        self.current_stock = Some(stock);
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
