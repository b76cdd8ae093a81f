//! Postgres Store
//!
//! sqlx implementation of the account and balance providers.
//! Connections are taken from the pool per statement and returned when the
//! statement future completes or is dropped.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Account, NewAccount, RequestContext};

use super::{AccountProvider, BalanceProvider, StoreError, StoreResult};

/// Postgres-backed account store
#[derive(Debug, Clone)]
pub struct PgBankStore {
    pool: PgPool,
}

impl PgBankStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountProvider for PgBankStore {
    async fn create_account(
        &self,
        ctx: &RequestContext,
        account: &NewAccount,
    ) -> StoreResult<Uuid> {
        let query = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO accounts (account_name, balance)
            VALUES ($1, $2)
            RETURNING uuid
            "#,
        )
        .bind(&account.name)
        .bind(account.balance)
        .fetch_one(&self.pool);

        let account_uuid: Uuid = ctx.run(query).await??;
        Ok(account_uuid)
    }

    async fn get_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> StoreResult<Account> {
        let query = sqlx::query_as::<_, Account>(
            r#"
            SELECT uuid AS id, account_name AS name, balance, created_at, updated_at
            FROM accounts
            WHERE uuid = $1
            "#,
        )
        .bind(account_uuid)
        .fetch_optional(&self.pool);

        ctx.run(query).await??.ok_or(StoreError::NotFound)
    }

    async fn delete_account(&self, ctx: &RequestContext, account_uuid: Uuid) -> StoreResult<()> {
        let query = sqlx::query("DELETE FROM accounts WHERE uuid = $1")
            .bind(account_uuid)
            .execute(&self.pool);

        let rows_affected = ctx.run(query).await??.rows_affected();
        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl BalanceProvider for PgBankStore {
    async fn adjust_balance(
        &self,
        ctx: &RequestContext,
        account_uuid: Uuid,
        delta: i64,
    ) -> StoreResult<()> {
        // Read-modify-write happens inside the statement; the row lock
        // serializes concurrent adjustments.
        let query = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + $1,
                updated_at = NOW()
            WHERE uuid = $2
            "#,
        )
        .bind(delta)
        .bind(account_uuid)
        .execute(&self.pool);

        let rows_affected = ctx.run(query).await??.rows_affected();
        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::debug!(%account_uuid, delta, "Balance adjusted");
        Ok(())
    }
}
