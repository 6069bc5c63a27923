//! `galley-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, ErrorKind};
pub use id::{ActorId, EntityId};
pub use rust_decimal::Decimal;
