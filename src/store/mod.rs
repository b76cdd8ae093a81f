//! Store module
//!
//! Persistence contract for accounts and its implementations.
//! Every operation targets one account row and honors the request context.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, NewAccount, RequestContext, TransactionDetails};

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use postgres::PgBankStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Account lifecycle operations
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Insert a new account; the store assigns the identifier
    async fn create_account(&self, ctx: &RequestContext, account: &NewAccount) -> StoreResult<Uuid>;

    async fn get_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> StoreResult<Account>;

    async fn delete_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> StoreResult<()>;
}

/// Balance mutations.
///
/// Implementations provide a single atomic `balance = balance + delta`
/// primitive; concurrent adjustments of one account must all be applied.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn adjust_balance(
        &self,
        ctx: &RequestContext,
        account_uuid: Uuid,
        delta: i64,
    ) -> StoreResult<()>;

    async fn deposit(&self, ctx: &RequestContext, details: &TransactionDetails) -> StoreResult<()> {
        self.adjust_balance(ctx, details.target_account_uuid, details.amount)
            .await
    }

    async fn withdraw(
        &self,
        ctx: &RequestContext,
        details: &TransactionDetails,
    ) -> StoreResult<()> {
        let delta = details
            .amount
            .checked_neg()
            .ok_or(StoreError::BalanceOutOfRange)?;
        self.adjust_balance(ctx, details.target_account_uuid, delta)
            .await
    }

    async fn refund(&self, ctx: &RequestContext, details: &TransactionDetails) -> StoreResult<()> {
        self.adjust_balance(ctx, details.target_account_uuid, details.amount)
            .await
    }
}
