//! Vendor API: balances, ledger and payout requests

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/vendors", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{org}/balance", get(handler::balance))
        .route("/{org}/transactions", get(handler::transactions))
        .route("/{org}/reconcile", get(handler::reconcile))
        .route("/{org}/payouts", get(handler::list_payouts).post(handler::request_payout))
}
