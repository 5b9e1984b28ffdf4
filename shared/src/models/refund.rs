//! Refund Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Refund status
///
/// `requested → approved → completed`, `requested → rejected`,
/// `requested|approved → cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum RefundStatus {
    Requested,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: RefundStatus) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Approved)
                | (Self::Requested, Self::Rejected)
                | (Self::Requested, Self::Cancelled)
                | (Self::Approved, Self::Completed)
                | (Self::Approved, Self::Cancelled)
        )
    }

    /// Rejected and cancelled refunds give the vendor their money back
    pub fn reverses_debit(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One refund per (order, vendor organization) per request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refund {
    pub id: i64,
    pub order_id: i64,
    pub organization_id: i64,
    pub status: RefundStatus,
    /// Customer-facing amount
    pub amount: Decimal,
    /// Vendor share debited from the vendor balance
    pub organization_amount: Decimal,
    pub platform_fee_amount: Decimal,
    pub reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Refunded portion of one order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundItem {
    pub id: i64,
    pub refund_id: i64,
    pub order_line_id: i64,
    pub variant_id: i64,
    pub quantity: i64,
    pub amount: Decimal,
    pub organization_amount: Decimal,
}

/// Refund with its items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundDetail {
    #[serde(flatten)]
    pub refund: Refund,
    pub items: Vec<RefundItem>,
}

/// A per-vendor refund that could not be created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundFailure {
    pub organization_id: i64,
    pub code: u16,
    pub message: String,
}

/// Result of a refund request: vendors succeed or fail independently
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RefundBatch {
    pub created: Vec<RefundDetail>,
    pub failures: Vec<RefundFailure>,
}

// =============================================================================
// Request types
// =============================================================================

/// One line to refund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundLineRequest {
    pub order_line_id: i64,
    pub quantity: i64,
}

/// Create refund payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefundRequest {
    #[serde(default)]
    pub reason: Option<String>,
    pub items: Vec<RefundLineRequest>,
}

/// Complete refund payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteRefundRequest {
    /// Return refunded units to the line's fulfillment location
    #[serde(default)]
    pub restock: bool,
}
