//! Prep production: turning raw inventory into prep stock.
//!
//! A production request moves through three states:
//!
//! - [`ProductionRequest`] (requested): the new prep stock the cook entered.
//! - [`ValidatedProduction`]: every ingredient draw has been computed and checked
//!   against the ledger. Nothing has been written yet.
//! - [`AppliedProduction`]: ingredient stock and prep stock have both been written.
//!
//! A request that fails validation is rejected with the error and leaves every
//! stock untouched.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::quantity::{checked_add, checked_mul, ensure_non_negative};
use galley_core::{DomainError, DomainResult};
use galley_inventory::{InventoryItemId, StockLedger};

use crate::item::{PrepItem, PrepItemId, PrepStatus};

/// Amount of one inventory item a production run draws down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientDraw {
    pub item_id: InventoryItemId,
    pub required: Decimal,
    pub available: Decimal,
}

impl IngredientDraw {
    pub fn shortfall(&self) -> Decimal {
        (self.required - self.available).max(Decimal::ZERO)
    }

    pub fn is_sufficient(&self) -> bool {
        self.required <= self.available
    }
}

/// Ingredient missing for a production run, with what it would take to cover it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub item_id: InventoryItemId,
    pub name: String,
    pub unit: String,
    pub shortfall: Decimal,
}

/// The cook's request: set this prep item's stock to `requested_stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRequest {
    pub prep_item_id: PrepItemId,
    pub requested_stock: Decimal,
}

impl ProductionRequest {
    pub fn new(prep_item_id: PrepItemId, requested_stock: Decimal) -> Self {
        Self {
            prep_item_id,
            requested_stock,
        }
    }

    /// Compute and check every ingredient draw. No stock is touched.
    pub fn validate(self, prep: &PrepItem, ledger: &StockLedger) -> DomainResult<ValidatedProduction> {
        if prep.id_typed() != self.prep_item_id {
            return Err(DomainError::invariant("prep_item_id mismatch"));
        }
        let draws = ingredient_draws(prep, self.requested_stock, ledger)?;

        if let Some(short) = draws.iter().find(|d| !d.is_sufficient()) {
            let name = ledger.require(short.item_id)?.name().to_string();
            return Err(DomainError::insufficient_stock(
                short.item_id.0,
                name,
                short.required,
                short.available,
            ));
        }

        Ok(ValidatedProduction {
            prep_item_id: self.prep_item_id,
            stock_before: prep.current_stock(),
            stock_after: self.requested_stock,
            draws,
        })
    }
}

/// A production run whose ingredient draws all fit in current stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProduction {
    prep_item_id: PrepItemId,
    stock_before: Decimal,
    stock_after: Decimal,
    draws: Vec<IngredientDraw>,
}

impl ValidatedProduction {
    pub fn draws(&self) -> &[IngredientDraw] {
        &self.draws
    }

    pub fn stock_after(&self) -> Decimal {
        self.stock_after
    }

    /// Write ingredient draws through the ledger, then the new prep stock.
    ///
    /// The ledger applies all draws as one unit, so if stock moved since
    /// validation the call fails and neither side is written.
    pub fn apply(self, prep: &mut PrepItem, ledger: &mut StockLedger) -> DomainResult<AppliedProduction> {
        if prep.id_typed() != self.prep_item_id {
            return Err(DomainError::invariant("prep_item_id mismatch"));
        }
        if prep.current_stock() != self.stock_before {
            return Err(DomainError::invariant(
                "prep stock changed between validation and apply",
            ));
        }

        let deltas: Vec<(InventoryItemId, Decimal)> = self
            .draws
            .iter()
            .map(|d| (d.item_id, -d.required))
            .collect();
        let ingredient_stock_after = ledger.apply_deltas(&deltas)?;

        prep.write_stock(self.stock_after);

        Ok(AppliedProduction {
            prep_item_id: self.prep_item_id,
            prep_stock_after: prep.current_stock(),
            status: prep.status(),
            ingredient_deltas: deltas,
            ingredient_stock_after,
        })
    }
}

/// Result of a completed production run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedProduction {
    pub prep_item_id: PrepItemId,
    pub prep_stock_after: Decimal,
    pub status: PrepStatus,
    /// Signed deltas written to the ledger (negative = consumed).
    pub ingredient_deltas: Vec<(InventoryItemId, Decimal)>,
    pub ingredient_stock_after: Vec<(InventoryItemId, Decimal)>,
}

/// Validate and apply in one call.
pub fn reconcile_production(
    prep: &mut PrepItem,
    requested_stock: Decimal,
    ledger: &mut StockLedger,
) -> DomainResult<AppliedProduction> {
    ProductionRequest::new(prep.id_typed(), requested_stock)
        .validate(prep, ledger)?
        .apply(prep, ledger)
}

/// Every ingredient that cannot cover a production run, in ingredient order.
///
/// Empty when the run would succeed (or consumes nothing).
pub fn shortfalls(
    prep: &PrepItem,
    requested_stock: Decimal,
    ledger: &StockLedger,
) -> DomainResult<Vec<Shortfall>> {
    ingredient_draws(prep, requested_stock, ledger)?
        .into_iter()
        .filter(|d| !d.is_sufficient())
        .map(|d| {
            let item = ledger.require(d.item_id)?;
            Ok(Shortfall {
                item_id: d.item_id,
                name: item.name().to_string(),
                unit: item.unit().to_string(),
                shortfall: d.shortfall(),
            })
        })
        .collect()
}

/// Draws per distinct inventory item, in first-seen ingredient order.
///
/// Only increases consume ingredients; a decrease or no-op returns no draws.
fn ingredient_draws(
    prep: &PrepItem,
    requested_stock: Decimal,
    ledger: &StockLedger,
) -> DomainResult<Vec<IngredientDraw>> {
    ensure_non_negative("requested stock", requested_stock)?;
    let delta = requested_stock - prep.current_stock();
    if delta <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let mut order: Vec<InventoryItemId> = Vec::new();
    let mut required: BTreeMap<InventoryItemId, Decimal> = BTreeMap::new();
    for ingredient in prep.ingredients() {
        let entry = required.entry(ingredient.item_id).or_insert_with(|| {
            order.push(ingredient.item_id);
            Decimal::ZERO
        });
        let draw = checked_mul("ingredient draw", ingredient.quantity_per_yield, delta)?;
        *entry = checked_add("ingredient draw", *entry, draw)?;
    }

    order
        .into_iter()
        .map(|item_id| {
            Ok(IngredientDraw {
                item_id,
                required: required[&item_id],
                available: ledger.available(item_id)?,
            })
        })
        .collect()
}
