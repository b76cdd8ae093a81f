//! Account model
//!
//! Balances are signed integers in minor currency units (cents).

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Persisted account row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    /// Store-assigned identifier, never client supplied
    pub id: Uuid,
    pub name: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to open an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    /// Initial balance in minor units
    pub balance: i64,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, balance: i64) -> Self {
        Self {
            name: name.into(),
            balance,
        }
    }
}

/// Target and amount of a single balance mutation. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionDetails {
    pub target_account_uuid: Uuid,
    /// Amount in minor units
    pub amount: i64,
}

impl TransactionDetails {
    pub fn new(target_account_uuid: Uuid, amount: i64) -> Self {
        Self {
            target_account_uuid,
            amount,
        }
    }
}
