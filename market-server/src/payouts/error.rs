use crate::balance::BalanceError;
use crate::db::Transient;
use crate::db::repository::RepoError;
use crate::utils::money::MoneyError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("Payout {0} not found")]
    NotFound(i64),

    #[error("Payout {0} has already been processed")]
    AlreadyProcessed(i64),

    #[error("Invalid payout request: {0}")]
    Validation(String),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for PayoutError {
    fn from(err: sqlx::Error) -> Self {
        PayoutError::Repo(err.into())
    }
}

impl From<MoneyError> for PayoutError {
    fn from(err: MoneyError) -> Self {
        PayoutError::Balance(err.into())
    }
}

impl Transient for PayoutError {
    fn is_transient(&self) -> bool {
        match self {
            PayoutError::Balance(e) => e.is_transient(),
            PayoutError::Repo(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<PayoutError> for AppError {
    fn from(err: PayoutError) -> Self {
        let message = err.to_string();
        match err {
            PayoutError::NotFound(id) => {
                AppError::with_message(ErrorCode::PayoutNotFound, message).with_detail("payout_id", id)
            }
            PayoutError::AlreadyProcessed(id) => {
                AppError::with_message(ErrorCode::PayoutAlreadyProcessed, message).with_detail("payout_id", id)
            }
            PayoutError::Validation(msg) => AppError::validation(msg),
            PayoutError::Balance(e) => e.into(),
            PayoutError::Repo(e) => e.into(),
        }
    }
}

pub type PayoutResult<T> = Result<T, PayoutError>;
