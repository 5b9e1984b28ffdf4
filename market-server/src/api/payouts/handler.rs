//! Payout API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{ProcessPayoutRequest, VendorPayout};

/// GET /api/payouts/:id
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<VendorPayout>> {
    Ok(Json(state.payouts.get(id).await?))
}

/// POST /api/payouts/:id/process - money has left the platform
pub async fn process(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProcessPayoutRequest>,
) -> AppResult<Json<VendorPayout>> {
    let payout = state
        .payouts
        .process(id, payload.external_reference.as_deref())
        .await?;
    Ok(Json(payout))
}
