//! Bank engine
//!
//! Validates requests against account invariants, calls the store and
//! reclassifies store failures into [`BankError`]. Holds no state between
//! calls; concurrent mutations of one account are serialized by the store.

use async_trait::async_trait;
use tracing::Span;
use uuid::Uuid;

use crate::domain::{Account, BankError, NewAccount, RequestContext, TransactionDetails};
use crate::store::{AccountProvider, BalanceProvider, StoreError};


/// Result type for engine operations
pub type BankResult<T> = Result<T, BankError>;

/// Operations the engine exposes to the transport layer
#[async_trait]
pub trait BankService: Send + Sync + 'static {
    async fn create_account(&self, ctx: &RequestContext, account: NewAccount) -> BankResult<Uuid>;
    async fn get_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> BankResult<Account>;
    async fn delete_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> BankResult<()>;
    async fn deposit(&self, ctx: &RequestContext, details: TransactionDetails) -> BankResult<()>;
    async fn withdraw(&self, ctx: &RequestContext, details: TransactionDetails) -> BankResult<()>;
    async fn refund(&self, ctx: &RequestContext, details: TransactionDetails) -> BankResult<()>;
}

/// Balance mutation kinds, dispatched to the matching provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Deposit,
    Withdraw,
    Refund,
}

impl Movement {
    fn op(self) -> &'static str {
        match self {
            Movement::Deposit => "Bank.Deposit",
            Movement::Withdraw => "Bank.Withdraw",
            Movement::Refund => "Bank.Refund",
        }
    }
}

/// The bank engine
pub struct Bank<A, B> {
    log: Span,
    accounts: A,
    balances: B,
}

impl<A, B> Bank<A, B>
where
    A: AccountProvider,
    B: BalanceProvider,
{
    /// Create an engine logging under `log`
    pub fn new(log: Span, accounts: A, balances: B) -> Self {
        Self {
            log,
            accounts,
            balances,
        }
    }

    #[tracing::instrument(
        name = "bank",
        parent = &self.log,
        skip_all,
        fields(
            op = "Bank.CreateAccount",
            account_name = %account.name,
            correlation_id = ?ctx.correlation_id
        )
    )]
    pub async fn create_account(
        &self,
        ctx: &RequestContext,
        account: NewAccount,
    ) -> BankResult<Uuid> {
        if account.balance < 0 {
            tracing::warn!(balance = account.balance, "negative initial balance");
            return Err(BankError::invalid_argument("negative balance forbidden"));
        }

        let account_uuid = self
            .accounts
            .create_account(ctx, &account)
            .await
            .map_err(|err| classify("Bank.CreateAccount", err))?;

        tracing::info!(%account_uuid, "account created");
        Ok(account_uuid)
    }

    #[tracing::instrument(
        name = "bank",
        parent = &self.log,
        skip_all,
        fields(op = "Bank.GetAccount", %account_uuid, correlation_id = ?ctx.correlation_id)
    )]
    pub async fn get_account(
        &self,
        ctx: &RequestContext,
        account_uuid: Uuid,
    ) -> BankResult<Account> {
        self.accounts
            .get_account(ctx, account_uuid)
            .await
            .map_err(|err| classify("Bank.GetAccount", err))
    }

    #[tracing::instrument(
        name = "bank",
        parent = &self.log,
        skip_all,
        fields(op = "Bank.DeleteAccount", %account_uuid, correlation_id = ?ctx.correlation_id)
    )]
    pub async fn delete_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> BankResult<()> {
        self.accounts
            .delete_account(ctx, account_uuid)
            .await
            .map_err(|err| classify("Bank.DeleteAccount", err))?;

        tracing::info!("account deleted");
        Ok(())
    }

    pub async fn deposit(
        &self,
        ctx: &RequestContext,
        details: TransactionDetails,
    ) -> BankResult<()> {
        self.move_balance(ctx, Movement::Deposit, details).await
    }

    /// Withdraw does not check funds; the balance may go negative.
    pub async fn withdraw(
        &self,
        ctx: &RequestContext,
        details: TransactionDetails,
    ) -> BankResult<()> {
        self.move_balance(ctx, Movement::Withdraw, details).await
    }

    pub async fn refund(
        &self,
        ctx: &RequestContext,
        details: TransactionDetails,
    ) -> BankResult<()> {
        self.move_balance(ctx, Movement::Refund, details).await
    }

    #[tracing::instrument(
        name = "bank",
        parent = &self.log,
        skip_all,
        fields(
            op = movement.op(),
            account_uuid = %details.target_account_uuid,
            correlation_id = ?ctx.correlation_id
        )
    )]
    async fn move_balance(
        &self,
        ctx: &RequestContext,
        movement: Movement,
        details: TransactionDetails,
    ) -> BankResult<()> {
        // Zero passes here; only negative amounts are rejected by the engine.
        if details.amount < 0 {
            tracing::warn!(amount = details.amount, "incorrect amount");
            return Err(BankError::invalid_argument("incorrect amount"));
        }

        let result = match movement {
            Movement::Deposit => self.balances.deposit(ctx, &details).await,
            Movement::Withdraw => self.balances.withdraw(ctx, &details).await,
            Movement::Refund => self.balances.refund(ctx, &details).await,
        };
        result.map_err(|err| classify(movement.op(), err))?;

        tracing::debug!(amount = details.amount, "balance updated");
        Ok(())
    }
}

/// Reclassify a store failure and log it inside the current operation span
fn classify(op: &'static str, err: StoreError) -> BankError {
    let err = BankError::from_store(op, err);
    match &err {
        BankError::NotFound => tracing::warn!("account not found"),
        BankError::AlreadyExists => tracing::warn!("account already exists"),
        BankError::Interrupted(reason) => tracing::warn!(%reason, "store call interrupted"),
        BankError::Internal { source, .. } => tracing::error!(error = %source, "store call failed"),
        BankError::InvalidArgument(_) => {}
    }
    err
}

#[async_trait]
impl<A, B> BankService for Bank<A, B>
where
    A: AccountProvider + 'static,
    B: BalanceProvider + 'static,
{
    async fn create_account(&self, ctx: &RequestContext, account: NewAccount) -> BankResult<Uuid> {
        Bank::create_account(self, ctx, account).await
    }

    async fn get_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> BankResult<Account> {
        Bank::get_account(self, ctx, account_uuid).await
    }

    async fn delete_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> BankResult<()> {
        Bank::delete_account(self, ctx, account_uuid).await
    }

    async fn deposit(&self, ctx: &RequestContext, details: TransactionDetails) -> BankResult<()> {
        Bank::deposit(self, ctx, details).await
    }

    async fn withdraw(&self, ctx: &RequestContext, details: TransactionDetails) -> BankResult<()> {
        Bank::withdraw(self, ctx, details).await
    }

    async fn refund(&self, ctx: &RequestContext, details: TransactionDetails) -> BankResult<()> {
        Bank::refund(self, ctx, details).await
    }
}
