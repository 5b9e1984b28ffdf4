//! Inventory API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/variants/{id}/availability", get(handler::availability))
        .route("/variants/{id}/locations/{location_id}", get(handler::stock_record))
        .route("/adjust", post(handler::adjust))
}
