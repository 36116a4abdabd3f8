//! Ledger entry repository

use sqlx::PgExecutor;

use crate::{DbError, DbLedgerEntry, DbResult};

/// Peer-to-peer transfer records
pub struct LedgerRepo;

impl LedgerRepo {
    /// Append an entry
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> DbResult<DbLedgerEntry> {
        sqlx::query_as::<_, DbLedgerEntry>(
            r#"
            INSERT INTO ledger_entries (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(amount)
        .fetch_one(executor)
        .await
        .map_err(|e| DbError::classify(e, "Ledger entry"))
    }

    /// Entries where the account is the sender
    pub async fn find_by_source<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
    ) -> DbResult<Vec<DbLedgerEntry>> {
        let entries = sqlx::query_as::<_, DbLedgerEntry>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at
            FROM ledger_entries
            WHERE from_account_id = $1
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }

    /// Entries where the account is the recipient
    pub async fn find_by_destination<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
    ) -> DbResult<Vec<DbLedgerEntry>> {
        let entries = sqlx::query_as::<_, DbLedgerEntry>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at
            FROM ledger_entries
            WHERE to_account_id = $1
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }
}
