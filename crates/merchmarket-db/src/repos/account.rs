//! Account repository

use sqlx::PgExecutor;

use crate::{DbAccount, DbError, DbResult};

/// Account queries. Each takes any executor so the same statement runs on
/// the pool or inside an open transaction.
pub struct AccountRepo;

impl AccountRepo {
    /// Create a new account
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        username: &str,
        password_hash: &str,
        balance: i64,
    ) -> DbResult<DbAccount> {
        sqlx::query_as::<_, DbAccount>(
            r#"
            INSERT INTO accounts (username, password_hash, balance)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, balance, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(balance)
        .fetch_one(executor)
        .await
        .map_err(|e| DbError::classify(e, &format!("Username {} already exists", username)))
    }

    /// Find account by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> DbResult<Option<DbAccount>> {
        let account = sqlx::query_as::<_, DbAccount>(
            r#"
            SELECT id, username, password_hash, balance, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(account)
    }

    /// Find account by username
    pub async fn find_by_username<'e, E: PgExecutor<'e>>(
        executor: E,
        username: &str,
    ) -> DbResult<Option<DbAccount>> {
        let account = sqlx::query_as::<_, DbAccount>(
            r#"
            SELECT id, username, password_hash, balance, created_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await?;

        Ok(account)
    }

    /// Find account by username, locking the row until the transaction ends
    pub async fn lock_by_username<'e, E: PgExecutor<'e>>(
        executor: E,
        username: &str,
    ) -> DbResult<Option<DbAccount>> {
        let account = sqlx::query_as::<_, DbAccount>(
            r#"
            SELECT id, username, password_hash, balance, created_at
            FROM accounts
            WHERE username = $1
            FOR UPDATE
            "#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await?;

        Ok(account)
    }

    /// Apply a signed delta to the balance and return the result
    pub async fn adjust_balance<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        delta: i64,
    ) -> DbResult<i64> {
        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE accounts SET balance = balance + $2 WHERE id = $1 RETURNING balance",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(executor)
        .await
        .map_err(|e| DbError::classify(e, &format!("Balance update for account {}", id)))?;

        balance.ok_or_else(|| DbError::NotFound(format!("Account {}", id)))
    }
}
