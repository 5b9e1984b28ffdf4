//! Utility module
//!
//! - [`AppError`] / [`ApiResponse`] re-exported from `shared::error`
//! - logger setup and money helpers

pub mod logger;
pub mod money;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
