use crate::balance::BalanceError;
use crate::collaborators::CollaboratorError;
use crate::db::Transient;
use crate::db::repository::RepoError;
use crate::inventory::InventoryError;
use crate::utils::money::MoneyError;
use shared::error::{AppError, ErrorCode};
use shared::models::{OrderStatus, RefundStatus};
use thiserror::Error;

/// Order orchestrator errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid order request: {0}")]
    Validation(String),

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Order line {line_id} not found on order {order_id}")]
    LineNotFound { order_id: i64, line_id: i64 },

    #[error("Refund not found: {0}")]
    RefundNotFound(i64),

    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidState {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {order_id} is {status}; {action} is not allowed")]
    InvalidStateFor {
        order_id: i64,
        status: OrderStatus,
        action: &'static str,
    },

    #[error("Refund {refund_id} cannot move from {from} to {to}")]
    RefundInvalidState {
        refund_id: i64,
        from: RefundStatus,
        to: RefundStatus,
    },

    #[error("Refund of {requested} exceeds the {refundable} refundable units of line {line_id}")]
    RefundExceedsQuantity {
        line_id: i64,
        requested: i64,
        refundable: i64,
    },

    #[error("Order lines mix currencies {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Variant not found: {0}")]
    VariantNotFound(i64),

    #[error("Variant {0} is not available for sale")]
    VariantInactive(i64),

    #[error("No single location can fulfill {quantity} units of variant {variant_id}")]
    NoFulfillmentLocation { variant_id: i64, quantity: i64 },

    #[error("Order {order_id} holds no reservation for {missing} units of variant {variant_id}")]
    ReservationNotFound {
        order_id: i64,
        variant_id: i64,
        missing: i64,
    },

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("Invalid amount: {0}")]
    Money(#[from] MoneyError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Repo(err.into())
    }
}

impl Transient for OrderError {
    fn is_transient(&self) -> bool {
        match self {
            OrderError::Inventory(e) => e.is_transient(),
            OrderError::Balance(e) => e.is_transient(),
            OrderError::Collaborator(e) => e.is_transient(),
            OrderError::Repo(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::EmptyOrder => AppError::with_message(ErrorCode::OrderEmpty, message),
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            OrderError::LineNotFound { order_id, line_id } => {
                AppError::with_message(ErrorCode::OrderLineNotFound, message)
                    .with_detail("order_id", order_id)
                    .with_detail("line_id", line_id)
            }
            OrderError::RefundNotFound(id) => {
                AppError::with_message(ErrorCode::RefundNotFound, message).with_detail("refund_id", id)
            }
            OrderError::InvalidState { order_id, from, to } => {
                AppError::with_message(ErrorCode::OrderInvalidState, message)
                    .with_detail("order_id", order_id)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::InvalidStateFor { order_id, status, .. } => {
                AppError::with_message(ErrorCode::OrderInvalidState, message)
                    .with_detail("order_id", order_id)
                    .with_detail("status", status.as_str())
            }
            OrderError::RefundInvalidState { refund_id, from, to } => {
                AppError::with_message(ErrorCode::RefundInvalidState, message)
                    .with_detail("refund_id", refund_id)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::RefundExceedsQuantity {
                line_id,
                requested,
                refundable,
            } => AppError::with_message(ErrorCode::RefundExceedsQuantity, message)
                .with_detail("line_id", line_id)
                .with_detail("requested", requested)
                .with_detail("refundable", refundable),
            OrderError::CurrencyMismatch(..) => AppError::with_message(ErrorCode::CurrencyMismatch, message),
            OrderError::VariantNotFound(id) => {
                AppError::with_message(ErrorCode::VariantNotFound, message).with_detail("variant_id", id)
            }
            OrderError::VariantInactive(id) => {
                AppError::with_message(ErrorCode::VariantInactive, message).with_detail("variant_id", id)
            }
            OrderError::NoFulfillmentLocation { variant_id, quantity } => {
                AppError::with_message(ErrorCode::InsufficientStock, message)
                    .with_detail("variant_id", variant_id)
                    .with_detail("requested", quantity)
            }
            OrderError::ReservationNotFound {
                order_id, variant_id, ..
            } => AppError::with_message(ErrorCode::ReservationNotFound, message)
                .with_detail("order_id", order_id)
                .with_detail("variant_id", variant_id),
            OrderError::Inventory(e) => e.into(),
            OrderError::Balance(e) => e.into(),
            OrderError::Collaborator(e) => e.into(),
            OrderError::Repo(e) => e.into(),
            OrderError::Money(_) => AppError::validation(message),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
