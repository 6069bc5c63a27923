//! Prep domain module (prep items, production reconciliation, recipe costing).
//!
//! This crate contains business rules for prep, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod costing;
pub mod item;
pub mod reconcile;

pub use costing::{record_prep_waste, unit_cost};
pub use item::{NewPrepItem, PrepIngredient, PrepItem, PrepItemId, PrepStatus, Station};
pub use reconcile::{
    AppliedProduction, IngredientDraw, ProductionRequest, Shortfall, ValidatedProduction,
    reconcile_production, shortfalls,
};
