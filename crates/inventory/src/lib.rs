//! Inventory domain module.
//!
//! This crate contains business rules for inventory stock, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;
pub mod ledger;
pub mod waste;

pub use item::{CategoryId, InventoryItem, InventoryItemId, NewInventoryItem, VendorId};
pub use ledger::StockLedger;
pub use waste::{WasteItem, WasteItemId, WasteItemType, normalize_reason, record_inventory_waste};
