//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{
    CancelOrderRequest, CreateOrderRequest, CreateRefundRequest, OrderDetail, RefundBatch, RefundDetail,
    UpdateOrderStatusRequest,
};

/// POST /api/orders - create an order and reserve its stock
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.orders.create_order(payload).await?;
    Ok(Json(detail))
}

/// GET /api/orders/:id
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.orders.get_order(id).await?))
}

/// POST /api/orders/:id/status - advance the lifecycle (or cancel)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.orders.update_status(id, payload).await?))
}

/// POST /api/orders/:id/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.orders.cancel(id, &payload.reason).await?))
}

/// POST /api/orders/:id/refunds - one refund per vendor involved
pub async fn request_refund(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateRefundRequest>,
) -> AppResult<Json<RefundBatch>> {
    Ok(Json(state.orders.request_refund(id, payload).await?))
}

/// GET /api/orders/:id/refunds
pub async fn list_refunds(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<RefundDetail>>> {
    Ok(Json(state.orders.list_refunds(id).await?))
}
