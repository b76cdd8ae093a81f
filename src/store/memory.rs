//! In-memory Store
//!
//! Map-backed implementation of the providers. Used for local runs and as the
//! store behind the router in tests. Each call counts towards [`InMemoryStore::calls`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Account, NewAccount, RequestContext};

use super::{AccountProvider, BalanceProvider, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    accounts: Mutex<HashMap<Uuid, Account>>,
    calls: AtomicUsize,
}

/// Shared in-memory account table. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of provider calls received so far
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.accounts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<Uuid, Account>> {
        self.inner
            .accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call, then give other tasks a chance to run the way a
    /// network round trip would.
    async fn enter(&self, ctx: &RequestContext) -> StoreResult<()> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        ctx.check()?;
        ctx.run(tokio::task::yield_now()).await?;
        Ok(())
    }

    fn insert(&self, account: &NewAccount) -> StoreResult<Uuid> {
        if account.name.is_empty() {
            return Err(StoreError::EmptyName);
        }

        let mut accounts = self.accounts();
        if accounts.values().any(|a| a.name == account.name) {
            return Err(StoreError::AlreadyExists);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        accounts.insert(
            id,
            Account {
                id,
                name: account.name.clone(),
                balance: account.balance,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn apply_delta(&self, account_uuid: Uuid, delta: i64) -> StoreResult<()> {
        let mut accounts = self.accounts();
        let account = accounts.get_mut(&account_uuid).ok_or(StoreError::NotFound)?;
        account.balance = account
            .balance
            .checked_add(delta)
            .ok_or(StoreError::BalanceOutOfRange)?;
        account.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl AccountProvider for InMemoryStore {
    async fn create_account(
        &self,
        ctx: &RequestContext,
        account: &NewAccount,
    ) -> StoreResult<Uuid> {
        self.enter(ctx).await?;
        self.insert(account)
    }

    async fn get_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> StoreResult<Account> {
        self.enter(ctx).await?;
        self.accounts()
            .get(&account_uuid)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> StoreResult<()> {
        self.enter(ctx).await?;
        self.accounts()
            .remove(&account_uuid)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl BalanceProvider for InMemoryStore {
    async fn adjust_balance(
        &self,
        ctx: &RequestContext,
        account_uuid: Uuid,
        delta: i64,
    ) -> StoreResult<()> {
        self.enter(ctx).await?;
        self.apply_delta(account_uuid, delta)
    }
}
