use crate::db::Transient;
use crate::db::repository::RepoError;
use crate::utils::money::MoneyError;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::BalanceField;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("Insufficient {} balance for organization {organization_id}: required {required}, available {available}", field.as_str())]
    InsufficientBalance {
        organization_id: i64,
        field: BalanceField,
        required: Decimal,
        available: Decimal,
    },

    #[error("Organization {0} not found")]
    OrganizationNotFound(i64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for BalanceError {
    fn from(err: sqlx::Error) -> Self {
        BalanceError::Repo(err.into())
    }
}

impl Transient for BalanceError {
    fn is_transient(&self) -> bool {
        matches!(self, BalanceError::Repo(e) if e.is_transient())
    }
}

impl From<BalanceError> for AppError {
    fn from(err: BalanceError) -> Self {
        let message = err.to_string();
        match err {
            BalanceError::InsufficientBalance {
                organization_id,
                field,
                required,
                available,
            } => AppError::with_message(ErrorCode::InsufficientBalance, message)
                .with_detail("organization_id", organization_id)
                .with_detail("field", field.as_str())
                .with_detail("required", required.to_string())
                .with_detail("available", available.to_string()),
            BalanceError::OrganizationNotFound(organization_id) => {
                AppError::with_message(ErrorCode::OrganizationNotFound, message)
                    .with_detail("organization_id", organization_id)
            }
            BalanceError::InvalidAmount(_) => AppError::with_message(ErrorCode::InvalidAmount, message),
            BalanceError::Repo(e) => e.into(),
        }
    }
}

pub type BalanceResult<T> = Result<T, BalanceError>;
