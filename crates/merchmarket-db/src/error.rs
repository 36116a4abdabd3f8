//! Database error types

use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DbError {
    /// Map a driver error, classifying unique and check violations by constraint name.
    pub(crate) fn classify(err: sqlx::Error, context: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DbError::Duplicate(context.to_string());
            }
            if db_err.is_check_violation() {
                let constraint = db_err.constraint().unwrap_or("check").to_string();
                return DbError::Constraint(format!("{}: {}", context, constraint));
            }
        }
        DbError::Query(err)
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
