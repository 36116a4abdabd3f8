//! Catalog and purchase repository

use sqlx::PgExecutor;

use crate::{DbError, DbInventoryItem, DbMerch, DbPurchase, DbResult};

/// Catalog and purchase queries
pub struct MerchRepo;

impl MerchRepo {
    /// Find catalog item by name
    pub async fn find_by_name<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> DbResult<Option<DbMerch>> {
        let item = sqlx::query_as::<_, DbMerch>("SELECT id, name, price FROM merch WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await?;

        Ok(item)
    }

    /// Record one purchased unit
    pub async fn create_purchase<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
        merch_id: i64,
    ) -> DbResult<DbPurchase> {
        sqlx::query_as::<_, DbPurchase>(
            r#"
            INSERT INTO purchases (account_id, merch_id)
            VALUES ($1, $2)
            RETURNING id, account_id, merch_id, created_at
            "#,
        )
        .bind(account_id)
        .bind(merch_id)
        .fetch_one(executor)
        .await
        .map_err(|e| DbError::classify(e, "Purchase"))
    }

    /// Count purchases per item for an account
    pub async fn inventory<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
    ) -> DbResult<Vec<DbInventoryItem>> {
        let items = sqlx::query_as::<_, DbInventoryItem>(
            r#"
            SELECT m.name AS name, COUNT(*)::BIGINT AS quantity
            FROM purchases p
            JOIN merch m ON m.id = p.merch_id
            WHERE p.account_id = $1
            GROUP BY m.name
            ORDER BY MIN(p.id)
            "#,
        )
        .bind(account_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }
}
