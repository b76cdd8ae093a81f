//! Domain Error Types
//!
//! The engine's own vocabulary. Store failures are reclassified into these
//! kinds before leaving the engine.

use thiserror::Error;

use super::Interrupted;
use crate::store::StoreError;

/// Errors returned by the bank engine
#[derive(Debug, Error)]
pub enum BankError {
    /// Referenced account does not exist
    #[error("account not found")]
    NotFound,

    /// Creation conflicts with a uniqueness constraint
    #[error("account already exists")]
    AlreadyExists,

    /// Malformed or out-of-policy input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The call was cancelled or ran past its deadline
    #[error(transparent)]
    Interrupted(#[from] Interrupted),

    /// Unclassified failure, with the operation that hit it
    #[error("{op}: {source}")]
    Internal {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl BankError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Classify a store failure raised while running `op`
    pub fn from_store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::AlreadyExists => Self::AlreadyExists,
            StoreError::Interrupted(reason) => Self::Interrupted(reason),
            source => Self::Internal { op, source },
        }
    }
}
