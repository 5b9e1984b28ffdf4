//! Data models
//!
//! Shared between market-server and API consumers.
//! Persisted enums use `#[cfg_attr(feature = "db", derive(sqlx::Type))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY, snowflake generated).
//! Money is `Decimal` in currency units.

pub mod balance;
pub mod catalog;
pub mod commission;
pub mod inventory;
pub mod order;
pub mod payout;
pub mod refund;

// Re-exports
pub use balance::*;
pub use catalog::*;
pub use commission::*;
pub use inventory::*;
pub use order::*;
pub use payout::*;
pub use refund::*;
