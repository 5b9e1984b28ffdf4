//! Inventory Model

use serde::{Deserialize, Serialize};

/// Stock count for one (variant, location)
///
/// Invariant: `0 <= reserved <= quantity`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockRecord {
    pub variant_id: i64,
    pub location_id: i64,
    /// Physically present
    pub quantity: i64,
    /// Committed to orders, not yet fulfilled
    pub reserved: i64,
    pub updated_at: i64,
}

impl StockRecord {
    /// Sellable right now
    pub fn available(&self) -> i64 {
        self.quantity - self.reserved
    }
}

/// Why a stock movement happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum MovementReason {
    /// `delta` applies to `reserved`
    Reserve,
    /// `delta` applies to `reserved` (negative)
    Release,
    /// `delta` applies to both `quantity` and `reserved` (negative)
    Fulfill,
    /// Manual correction, `delta` applies to `quantity`
    Adjust,
    /// Units returned by a completed refund, `delta` applies to `quantity`
    Return,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Release => "release",
            Self::Fulfill => "fulfill",
            Self::Adjust => "adjust",
            Self::Return => "return",
        }
    }
}

/// Append-only audit row written with every stock mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub variant_id: i64,
    pub location_id: i64,
    pub delta: i64,
    pub reason: MovementReason,
    pub order_id: Option<i64>,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Manual stock correction payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub variant_id: i64,
    pub location_id: i64,
    pub delta: i64,
    pub reason: String,
}

/// Checkout-time availability for a variant across all locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantAvailability {
    pub variant_id: i64,
    pub total_available: i64,
}
