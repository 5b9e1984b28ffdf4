//! API routes
//!
//! - [`health`] - liveness and database check
//! - [`orders`] - order creation, lifecycle and refund requests
//! - [`refunds`] - refund state machine
//! - [`vendors`] - vendor balances, ledger and payouts
//! - [`payouts`] - payout processing
//! - [`inventory`] - availability and manual stock adjustments
//!
//! Handlers return `AppResult<Json<T>>`; errors render as
//! [`shared::error::ApiResponse`] with the mapped HTTP status.

pub mod health;
pub mod inventory;
pub mod orders;
pub mod payouts;
pub mod refunds;
pub mod vendors;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub use crate::utils::{AppError, AppResult};

/// Every route plus the HTTP middleware stack
pub fn build_app(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(refunds::router())
        .merge(vendors::router())
        .merge(payouts::router())
        .merge(inventory::router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new()),
        )
}
