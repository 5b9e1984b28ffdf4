//! Vendor API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{BalanceReconciliation, PayoutRequest, VendorBalance, VendorBalanceTransaction, VendorPayout};

/// GET /api/vendors/:org/balance - zeroed when the vendor has no activity
pub async fn balance(State(state): State<ServerState>, Path(org): Path<i64>) -> AppResult<Json<VendorBalance>> {
    Ok(Json(state.balance.balance(org).await?))
}

/// GET /api/vendors/:org/transactions
pub async fn transactions(
    State(state): State<ServerState>,
    Path(org): Path<i64>,
) -> AppResult<Json<Vec<VendorBalanceTransaction>>> {
    Ok(Json(state.balance.transactions(org).await?))
}

/// GET /api/vendors/:org/reconcile - cached balance against the folded log
pub async fn reconcile(
    State(state): State<ServerState>,
    Path(org): Path<i64>,
) -> AppResult<Json<BalanceReconciliation>> {
    Ok(Json(state.balance.reconcile(org).await?))
}

/// POST /api/vendors/:org/payouts
pub async fn request_payout(
    State(state): State<ServerState>,
    Path(org): Path<i64>,
    Json(payload): Json<PayoutRequest>,
) -> AppResult<Json<VendorPayout>> {
    let payout = state
        .payouts
        .request(org, payload.amount, &payload.destination)
        .await?;
    Ok(Json(payout))
}

/// GET /api/vendors/:org/payouts - newest first
pub async fn list_payouts(
    State(state): State<ServerState>,
    Path(org): Path<i64>,
) -> AppResult<Json<Vec<VendorPayout>>> {
    Ok(Json(state.payouts.list(org).await?))
}
