//! Shared types for the marketplace
//!
//! Domain records, status enums, error codes and response structures used
//! by the server and by API consumers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
