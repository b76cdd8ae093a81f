//! Store Errors
//!
//! Error types for account persistence.

use crate::domain::Interrupted;

/// SQLSTATE for numeric_value_out_of_range
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur in the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matched the identifier
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated
    #[error("already exists")]
    AlreadyExists,

    /// The account name is empty
    #[error("empty account name")]
    EmptyName,

    /// The balance would leave the representable range
    #[error("balance out of range")]
    BalanceOutOfRange,

    /// The call was cancelled or ran past its deadline
    #[error(transparent)]
    Interrupted(#[from] Interrupted),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::AlreadyExists;
            }
            // The only CHECK on accounts is the non-empty name
            if db_err.is_check_violation() {
                return StoreError::EmptyName;
            }
            if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
                return StoreError::BalanceOutOfRange;
            }
        }
        StoreError::Database(err)
    }
}
