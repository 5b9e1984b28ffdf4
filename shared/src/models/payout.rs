//! Vendor Payout Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PayoutStatus {
    Pending,
    Processed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
        }
    }
}

/// Request to move funds from available balance to an external rail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorPayout {
    pub id: i64,
    pub organization_id: i64,
    pub amount: Decimal,
    pub status: PayoutStatus,
    /// Bank account / wallet label, opaque to the core
    pub destination: String,
    /// Reference returned by the payment rail once processed
    pub external_reference: Option<String>,
    pub created_at: i64,
    pub processed_at: Option<i64>,
}

/// Payout request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub amount: Decimal,
    pub destination: String,
}

/// Process payout payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessPayoutRequest {
    #[serde(default)]
    pub external_reference: Option<String>,
}
