//! Ordering domain module (reorder suggestions, pending order, order history).
//!
//! This crate contains business rules for ordering, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod history;
pub mod pending;
pub mod suggest;

pub use history::{Order, OrderHistoryLine, OrderId, complete_order};
pub use pending::{LineRequest, OrderLineId, OrderLineItem, OrderLineStatus, PendingOrder};
pub use suggest::{ReorderPrice, SuggestedItem, Urgency, compute_suggestions};
