//! Refund API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{CompleteRefundRequest, RefundDetail};

/// GET /api/refunds/:id
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<RefundDetail>> {
    Ok(Json(state.orders.get_refund(id).await?))
}

/// POST /api/refunds/:id/approve
pub async fn approve(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<RefundDetail>> {
    Ok(Json(state.orders.approve_refund(id).await?))
}

/// POST /api/refunds/:id/reject - credits the vendor share back
pub async fn reject(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<RefundDetail>> {
    Ok(Json(state.orders.reject_refund(id).await?))
}

/// POST /api/refunds/:id/complete
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CompleteRefundRequest>,
) -> AppResult<Json<RefundDetail>> {
    Ok(Json(state.orders.complete_refund(id, payload.restock).await?))
}

/// POST /api/refunds/:id/cancel - credits the vendor share back
pub async fn cancel(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<RefundDetail>> {
    Ok(Json(state.orders.cancel_refund(id).await?))
}
