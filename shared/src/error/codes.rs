//! Unified error codes for the marketplace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Refund and payout errors
//! - 6xxx: Catalog and inventory errors
//! - 7xxx: Vendor balance errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order line not found
    OrderLineNotFound = 4002,
    /// Transition not allowed from the order's current status
    OrderInvalidState = 4003,
    /// Order has no lines
    OrderEmpty = 4004,
    /// Lines use more than one currency
    CurrencyMismatch = 4005,
    /// Shipping method missing or inactive
    ShippingMethodInvalid = 4101,

    // ==================== 5xxx: Refund / Payout ====================
    /// Refund not found
    RefundNotFound = 5001,
    /// Transition not allowed from the refund's current status
    RefundInvalidState = 5002,
    /// Requested quantity exceeds the refundable quantity
    RefundExceedsQuantity = 5003,
    /// Payout not found
    PayoutNotFound = 5101,
    /// Payout has already been processed
    PayoutAlreadyProcessed = 5102,

    // ==================== 6xxx: Catalog / Inventory ====================
    /// Variant not found
    VariantNotFound = 6001,
    /// Variant is not for sale
    VariantInactive = 6002,
    /// No stock record for the variant at the location
    StockRecordNotFound = 6102,
    /// Not enough available stock
    InsufficientStock = 6103,
    /// No reservation held for the order line
    ReservationNotFound = 6104,
    /// Bundle not found
    BundleNotFound = 6201,
    /// Bundle cannot cover the requested quantity
    BundleUnavailable = 6202,

    // ==================== 7xxx: Vendor balance ====================
    /// Organization not found
    OrganizationNotFound = 7001,
    /// Balance precondition failed
    InsufficientBalance = 7101,
    /// Amount must be positive and representable in cents
    InvalidAmount = 7102,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// System busy (write conflict, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderLineNotFound => "Order line not found",
            ErrorCode::OrderInvalidState => "Order status does not allow this operation",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::CurrencyMismatch => "Order lines must share one currency",
            ErrorCode::ShippingMethodInvalid => "Shipping method is not available",

            // Refund / Payout
            ErrorCode::RefundNotFound => "Refund not found",
            ErrorCode::RefundInvalidState => "Refund status does not allow this operation",
            ErrorCode::RefundExceedsQuantity => "Refund quantity exceeds refundable quantity",
            ErrorCode::PayoutNotFound => "Payout not found",
            ErrorCode::PayoutAlreadyProcessed => "Payout has already been processed",

            // Catalog / Inventory
            ErrorCode::VariantNotFound => "Variant not found",
            ErrorCode::VariantInactive => "Variant is not available for sale",
            ErrorCode::StockRecordNotFound => "Stock record not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::ReservationNotFound => "No reservation found for order line",
            ErrorCode::BundleNotFound => "Bundle not found",
            ErrorCode::BundleUnavailable => "Bundle is not available in the requested quantity",

            // Vendor balance
            ErrorCode::OrganizationNotFound => "Organization not found",
            ErrorCode::InsufficientBalance => "Insufficient balance",
            ErrorCode::InvalidAmount => "Invalid amount",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderLineNotFound),
            4003 => Ok(ErrorCode::OrderInvalidState),
            4004 => Ok(ErrorCode::OrderEmpty),
            4005 => Ok(ErrorCode::CurrencyMismatch),
            4101 => Ok(ErrorCode::ShippingMethodInvalid),

            // Refund / Payout
            5001 => Ok(ErrorCode::RefundNotFound),
            5002 => Ok(ErrorCode::RefundInvalidState),
            5003 => Ok(ErrorCode::RefundExceedsQuantity),
            5101 => Ok(ErrorCode::PayoutNotFound),
            5102 => Ok(ErrorCode::PayoutAlreadyProcessed),

            // Catalog / Inventory
            6001 => Ok(ErrorCode::VariantNotFound),
            6002 => Ok(ErrorCode::VariantInactive),
            6102 => Ok(ErrorCode::StockRecordNotFound),
            6103 => Ok(ErrorCode::InsufficientStock),
            6104 => Ok(ErrorCode::ReservationNotFound),
            6201 => Ok(ErrorCode::BundleNotFound),
            6202 => Ok(ErrorCode::BundleUnavailable),

            // Vendor balance
            7001 => Ok(ErrorCode::OrganizationNotFound),
            7101 => Ok(ErrorCode::InsufficientBalance),
            7102 => Ok(ErrorCode::InvalidAmount),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::RefundInvalidState.code(), 5002);
        assert_eq!(ErrorCode::InsufficientStock.code(), 6103);
        assert_eq!(ErrorCode::InsufficientBalance.code(), 7101);
        assert_eq!(ErrorCode::SystemBusy.code(), 9404);
    }

    #[test]
    fn test_try_from_round_trips_every_known_code() {
        let codes = [
            ErrorCode::ValidationFailed,
            ErrorCode::OrderInvalidState,
            ErrorCode::ShippingMethodInvalid,
            ErrorCode::PayoutAlreadyProcessed,
            ErrorCode::OrganizationNotFound,
            ErrorCode::ReservationNotFound,
            ErrorCode::BundleUnavailable,
            ErrorCode::InvalidAmount,
            ErrorCode::DatabaseError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_unknown_value() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "6103");
        let code: ErrorCode = serde_json::from_str("7101").unwrap();
        assert_eq!(code, ErrorCode::InsufficientBalance);
    }
}
