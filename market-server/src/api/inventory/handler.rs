//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use shared::models::{StockAdjustment, StockRecord, VariantAvailability};

/// GET /api/inventory/variants/:id/availability - sum over active locations
pub async fn availability(
    State(state): State<ServerState>,
    Path(variant_id): Path<i64>,
) -> AppResult<Json<VariantAvailability>> {
    let total_available = state.inventory.total_available(variant_id).await?;
    Ok(Json(VariantAvailability {
        variant_id,
        total_available,
    }))
}

/// GET /api/inventory/variants/:id/locations/:location_id
pub async fn stock_record(
    State(state): State<ServerState>,
    Path((variant_id, location_id)): Path<(i64, i64)>,
) -> AppResult<Json<StockRecord>> {
    Ok(Json(state.inventory.get(variant_id, location_id).await?))
}

/// POST /api/inventory/adjust - manual correction with a reason
pub async fn adjust(
    State(state): State<ServerState>,
    Json(payload): Json<StockAdjustment>,
) -> AppResult<Json<StockRecord>> {
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("an adjustment reason is required"));
    }
    let record = state
        .inventory
        .adjust(payload.variant_id, payload.location_id, payload.delta, reason)
        .await?;
    Ok(Json(record))
}
