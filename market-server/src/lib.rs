//! Marketplace server
//!
//! Core of a multi-vendor marketplace:
//!
//! - [`commission`] - platform fee resolution per order line
//! - [`inventory`] - stock reservations per variant and location
//! - [`balance`] - per-vendor balance ledger with an append-only log
//! - [`payouts`] - vendor payout requests and processing
//! - [`orders`] - order orchestration, cancellation and refunds
//! - [`api`] - HTTP surface over the above

pub mod api;
pub mod balance;
pub mod collaborators;
pub mod commission;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod payouts;
pub mod utils;

pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};
