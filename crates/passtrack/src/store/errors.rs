use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// Tracked user not found.
    #[error("user not found: id={0}")]
    UserNotFound(i64),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
