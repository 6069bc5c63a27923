//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::EntityId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Machine-readable classification of a [`DomainError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    InsufficientStock,
    EmptyOrder,
    NotFound,
    InvariantViolation,
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every variant is
/// returned before the operation that detected it has written anything.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (non-positive quantity, negative price, missing unit).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Ingredient or inventory shortfall.
    #[error(
        "insufficient stock for {item_name} ({item_id}): required {required}, available {available}, short by {shortfall}"
    )]
    InsufficientStock {
        item_id: EntityId,
        item_name: String,
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    /// Order completion attempted with no pending lines.
    #[error("cannot complete an order with no pending lines")]
    EmptyOrder,

    /// A referenced item or line does not exist in the caller's scope.
    #[error("not found: {0}")]
    NotFound(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Shortfall of `required` against `available`.
    pub fn insufficient_stock(
        item_id: EntityId,
        item_name: impl Into<String>,
        required: Decimal,
        available: Decimal,
    ) -> Self {
        Self::InsufficientStock {
            item_id,
            item_name: item_name.into(),
            required,
            available,
            shortfall: (required - available).max(Decimal::ZERO),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DomainError::EmptyOrder => ErrorKind::EmptyOrder,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }
}
