//! Collaborator seams
//!
//! The core owns stock, money and orders. Catalog data, bundle
//! composition, shipping rates and notification delivery belong to other
//! services and are reached through these traits, injected into the
//! orchestrator at construction. The `Sql*` implementations read the
//! local catalog tables.

pub mod catalog;
pub mod events;
pub mod shipping;

pub use catalog::{SqlBundles, SqlCatalog};
pub use events::OrderEventBus;
pub use shipping::SqlShipping;

use crate::db::Transient;
use crate::db::repository::RepoError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{BundleComponent, OrderNotification, ShippingMethod, VariantSnapshot};
use thiserror::Error;

use crate::utils::money::round_money;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("{resource} {id} is not active")]
    Inactive { resource: &'static str, id: i64 },

    #[error("Bundle {bundle_id} cannot cover {requested} more units")]
    BundleUnavailable { bundle_id: i64, requested: i64 },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for CollaboratorError {
    fn from(err: sqlx::Error) -> Self {
        CollaboratorError::Repo(err.into())
    }
}

impl Transient for CollaboratorError {
    fn is_transient(&self) -> bool {
        matches!(self, CollaboratorError::Repo(e) if e.is_transient())
    }
}

impl From<CollaboratorError> for AppError {
    fn from(err: CollaboratorError) -> Self {
        let message = err.to_string();
        match err {
            CollaboratorError::NotFound { resource, id } => {
                let code = match resource {
                    "bundle" => ErrorCode::BundleNotFound,
                    "shipping method" => ErrorCode::ShippingMethodInvalid,
                    "variant" => ErrorCode::VariantNotFound,
                    _ => ErrorCode::NotFound,
                };
                AppError::with_message(code, message).with_detail("id", id)
            }
            CollaboratorError::Inactive { resource, id } => {
                let code = match resource {
                    "bundle" => ErrorCode::BundleUnavailable,
                    "shipping method" => ErrorCode::ShippingMethodInvalid,
                    _ => ErrorCode::VariantInactive,
                };
                AppError::with_message(code, message).with_detail("id", id)
            }
            CollaboratorError::BundleUnavailable { bundle_id, requested } => {
                AppError::with_message(ErrorCode::BundleUnavailable, message)
                    .with_detail("bundle_id", bundle_id)
                    .with_detail("requested", requested)
            }
            CollaboratorError::Repo(e) => e.into(),
        }
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Variant data the orchestrator prices and routes lines with
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Snapshots for the ids that exist; missing ids are simply absent.
    /// Every field of a snapshot is populated.
    async fn load_variants(&self, ids: &[i64]) -> CollaboratorResult<Vec<VariantSnapshot>>;
}

/// Bundle composition and bundle-level reservation counters
#[async_trait]
pub trait BundleService: Send + Sync {
    async fn components(&self, bundle_id: i64) -> CollaboratorResult<Vec<BundleComponent>>;

    async fn reserve(&self, bundle_id: i64, qty: i64, order_id: i64) -> CollaboratorResult<()>;

    async fn release(&self, bundle_id: i64, qty: i64, order_id: i64) -> CollaboratorResult<()>;
}

#[async_trait]
pub trait ShippingService: Send + Sync {
    /// The method if it exists and is active
    async fn validate_method(&self, method_id: i64) -> CollaboratorResult<ShippingMethod>;

    /// `base + per_kg · weight`, free once `subtotal` reaches `free_over`
    fn calculate_rate(&self, method: &ShippingMethod, total_weight: Decimal, subtotal: Decimal) -> Decimal {
        if method.free_over.is_some_and(|threshold| subtotal >= threshold) {
            return Decimal::ZERO;
        }
        round_money(method.base_rate + method.per_kg_rate * total_weight)
    }
}

/// Fire-and-forget order notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: OrderNotification);
}
