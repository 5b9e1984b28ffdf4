use crate::db::Transient;
use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("No stock record for variant {variant_id} at location {location_id}")]
    NotFound { variant_id: i64, location_id: i64 },

    #[error(
        "Insufficient stock for variant {variant_id} at location {location_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        variant_id: i64,
        location_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("Adjustment of {delta} would leave variant {variant_id} at location {location_id} below its reservations")]
    AdjustmentBelowReserved {
        variant_id: i64,
        location_id: i64,
        delta: i64,
    },

    #[error("Stock record for variant {variant_id} at location {location_id} kept changing")]
    Contended { variant_id: i64, location_id: i64 },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        InventoryError::Repo(err.into())
    }
}

impl Transient for InventoryError {
    fn is_transient(&self) -> bool {
        match self {
            InventoryError::Repo(e) => e.is_transient(),
            InventoryError::Contended { .. } => true,
            _ => false,
        }
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        let message = err.to_string();
        match err {
            InventoryError::NotFound {
                variant_id,
                location_id,
            } => AppError::with_message(ErrorCode::StockRecordNotFound, message)
                .with_detail("variant_id", variant_id)
                .with_detail("location_id", location_id),
            InventoryError::InsufficientStock {
                variant_id,
                location_id,
                requested,
                available,
            } => AppError::with_message(ErrorCode::InsufficientStock, message)
                .with_detail("variant_id", variant_id)
                .with_detail("location_id", location_id)
                .with_detail("requested", requested)
                .with_detail("available", available),
            InventoryError::InvalidQuantity(_) | InventoryError::AdjustmentBelowReserved { .. } => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message)
            }
            InventoryError::Contended { .. } => AppError::busy(message),
            InventoryError::Repo(e) => e.into(),
        }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;
