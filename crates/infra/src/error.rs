//! Errors surfaced by the kitchen service.

use thiserror::Error;

use galley_core::{DomainError, ErrorKind};

use crate::store::StoreError;

pub type KitchenResult<T> = Result<T, KitchenError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KitchenError {
    /// Business rule rejected the request; nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl KitchenError {
    /// Machine-readable kind for domain rejections; `None` for storage failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            KitchenError::Domain(e) => Some(e.kind()),
            KitchenError::Store(_) => None,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            KitchenError::Domain(e) => Some(e),
            KitchenError::Store(_) => None,
        }
    }
}
