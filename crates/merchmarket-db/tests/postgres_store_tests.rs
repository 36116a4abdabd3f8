//! PostgreSQL Store Tests
//!
//! Exercise the SQL backend against a live database. Run with
//! `DATABASE_URL=postgresql://... cargo test -- --ignored`.

use merchmarket_db::{Database, DatabaseConfig, DbError, Store};

async fn connect() -> Database {
    let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
    let db = Database::connect(&config).await.expect("connect");
    db.migrate().await.expect("migrate");
    db
}

fn unique(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_catalog_is_seeded() {
    let db = connect().await;
    let cup = db.find_catalog_item_by_name("cup").await.unwrap().unwrap();
    assert_eq!(cup.price, 20);
    let hoody = db.find_catalog_item_by_name("pink-hoody").await.unwrap().unwrap();
    assert_eq!(hoody.price, 500);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_username_is_classified() {
    let db = connect().await;
    let name = unique("dup");
    db.create_account(&name, "hash", 1000).await.unwrap();
    let result = db.create_account(&name, "hash", 1000).await;
    assert!(matches!(result, Err(DbError::Duplicate(_))));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_transaction_commit_and_rollback() {
    let db = connect().await;
    let alice = db.create_account(&unique("alice"), "hash", 100).await.unwrap();
    let bob = db.create_account(&unique("bob"), "hash", 50).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let locked = tx
        .find_account_by_username_for_update(&alice.username)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(locked.balance, 100);
    tx.update_account_balance(alice.id, -30).await.unwrap();
    tx.update_account_balance(bob.id, 30).await.unwrap();
    tx.create_ledger_entry(alice.id, bob.id, 30).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    tx.update_account_balance(alice.id, -70).await.unwrap();
    tx.rollback().await.unwrap();

    let alice = db.find_account_by_id(alice.id).await.unwrap().unwrap();
    let bob = db.find_account_by_id(bob.id).await.unwrap().unwrap();
    assert_eq!(alice.balance, 70);
    assert_eq!(bob.balance, 80);
    assert_eq!(db.find_ledger_entries_by_source(alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_negative_balance_violates_constraint() {
    let db = connect().await;
    let carol = db.create_account(&unique("carol"), "hash", 10).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let result = tx.update_account_balance(carol.id, -11).await;
    assert!(matches!(result, Err(DbError::Constraint(_))));
}
