//! Repository Module
//!
//! Row-level SQL for every table. Functions take a
//! `&mut SqliteConnection` so they run the same way on a pooled
//! connection or inside a caller's transaction. Money columns are cents.

pub mod balance;
pub mod catalog;
pub mod order;
pub mod payout;
pub mod refund;
pub mod stock;

use crate::db::retry::{Transient, is_transient_sqlx};
use crate::utils::money::MoneyError;
use shared::error::AppError;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<MoneyError> for RepoError {
    fn from(err: MoneyError) -> Self {
        RepoError::Validation(err.to_string())
    }
}

impl Transient for RepoError {
    fn is_transient(&self) -> bool {
        match self {
            RepoError::Database(e) => is_transient_sqlx(e),
            _ => false,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(e) if is_transient_sqlx(&e) => {
                AppError::busy(format!("Store busy: {e}"))
            }
            RepoError::Database(e) => AppError::database(e.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_repo_error_mapping() {
        let err: AppError = RepoError::Validation("negative amount".into()).into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err: AppError = RepoError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.code, ErrorCode::SystemBusy);

        let err: AppError = RepoError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_transient_classification() {
        assert!(RepoError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!RepoError::Validation("x".into()).is_transient());
    }
}
