use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::quantity::{ensure_non_negative, ensure_positive, ensure_unit};
use galley_core::{DomainError, DomainResult, Entity, entity_id};
use galley_inventory::InventoryItemId;

entity_id!(
    /// Prep item identifier.
    PrepItemId
);

/// Kitchen station a prep item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Station {
    Grill,
    Saute,
    Sauces,
    Salads,
    Events,
    Other,
}

/// Derived prep status, stored alongside stock so readers need not recompute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrepStatus {
    Urgent,
    Needed,
    NotNeeded,
}

impl PrepStatus {
    /// `Urgent` when nothing is left, `Needed` below par, otherwise `NotNeeded`.
    pub fn derive(current_stock: Decimal, par_level: Decimal) -> Self {
        if current_stock <= Decimal::ZERO {
            PrepStatus::Urgent
        } else if current_stock < par_level {
            PrepStatus::Needed
        } else {
            PrepStatus::NotNeeded
        }
    }
}

/// One raw ingredient consumed per unit of prep yield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepIngredient {
    pub item_id: InventoryItemId,
    pub quantity_per_yield: Decimal,
    pub unit: String,
}

impl PrepIngredient {
    pub fn new(
        item_id: InventoryItemId,
        quantity_per_yield: Decimal,
        unit: impl Into<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            item_id,
            quantity_per_yield: ensure_positive("quantity_per_yield", quantity_per_yield)?,
            unit: ensure_unit(&unit.into())?,
        })
    }
}

/// Fields required to register a prep item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPrepItem {
    pub id: PrepItemId,
    pub name: String,
    pub station: Station,
    pub current_stock: Decimal,
    pub par_level: Decimal,
    pub yield_unit: String,
    pub ingredients: Vec<PrepIngredient>,
}

/// Something the kitchen makes in advance from raw inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepItem {
    id: PrepItemId,
    name: String,
    station: Station,
    current_stock: Decimal,
    par_level: Decimal,
    yield_unit: String,
    status: PrepStatus,
    ingredients: Vec<PrepIngredient>,
}

impl PrepItem {
    pub fn new(new: NewPrepItem) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let current_stock = ensure_non_negative("current_stock", new.current_stock)?;
        let par_level = ensure_non_negative("par_level", new.par_level)?;

        Ok(Self {
            id: new.id,
            name: new.name.trim().to_string(),
            station: new.station,
            current_stock,
            par_level,
            yield_unit: ensure_unit(&new.yield_unit)?,
            status: PrepStatus::derive(current_stock, par_level),
            ingredients: new.ingredients,
        })
    }

    pub fn id_typed(&self) -> PrepItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn station(&self) -> Station {
        self.station
    }

    pub fn current_stock(&self) -> Decimal {
        self.current_stock
    }

    pub fn par_level(&self) -> Decimal {
        self.par_level
    }

    pub fn yield_unit(&self) -> &str {
        &self.yield_unit
    }

    pub fn status(&self) -> PrepStatus {
        self.status
    }

    pub fn ingredients(&self) -> &[PrepIngredient] {
        &self.ingredients
    }

    /// Stored status agrees with stock and par. A mismatch means a write skipped
    /// the recompute.
    pub fn status_is_consistent(&self) -> bool {
        self.status == PrepStatus::derive(self.current_stock, self.par_level)
    }

    pub fn set_par_level(&mut self, par_level: Decimal) -> DomainResult<()> {
        self.par_level = ensure_non_negative("par_level", par_level)?;
        self.refresh_status();
        Ok(())
    }

    pub fn set_ingredients(&mut self, ingredients: Vec<PrepIngredient>) {
        self.ingredients = ingredients;
    }

    pub(crate) fn write_stock(&mut self, stock: Decimal) {
        self.current_stock = stock;
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        self.status = PrepStatus::derive(self.current_stock, self.par_level);
    }
}

impl Entity for PrepItem {
    type Id = PrepItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
