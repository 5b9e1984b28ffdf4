//! Order Model

use super::commission::{CommissionSource, FeeType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// `pending → processing → shipped → delivered`, `cancelled` from
/// `pending`/`processing`, and `refunded` once every line is fully
/// refunded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Forward lifecycle transitions a caller may request.
    ///
    /// `refunded` is reached only through the refund flow and `cancelled`
    /// only through cancel, so neither is accepted here.
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
        )
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order entity (aggregate root)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    /// `MKT{yyyymmdd}{suffix}`
    pub order_number: String,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub currency: String,
    pub subtotal: Decimal,
    pub shipping_amount: Decimal,
    pub total: Decimal,
    pub platform_fee_total: Decimal,
    pub shipping_method_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line, owned by exactly one vendor organization.
///
/// Commission fields are frozen at creation and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub variant_id: i64,
    pub product_id: i64,
    pub organization_id: i64,
    /// Location chosen at creation; reservations and fulfillment use it
    pub location_id: i64,
    /// Set when the line came from a bundle expansion
    pub bundle_id: Option<i64>,
    pub sku: String,
    pub quantity: i64,
    pub refunded_quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub fee_type: FeeType,
    pub fee_rate: Decimal,
    pub platform_fee_amount: Decimal,
    pub organization_amount: Decimal,
    pub commission_source: CommissionSource,
}

impl OrderLine {
    pub fn refundable_quantity(&self) -> i64 {
        self.quantity - self.refunded_quantity
    }
}

/// Append-only status history entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderStatusHistory {
    pub id: i64,
    pub order_id: i64,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub reason: Option<String>,
    pub created_at: i64,
}

/// Order with its lines and full status history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub history: Vec<OrderStatusHistory>,
}

// =============================================================================
// Request types
// =============================================================================

/// One requested item: either a variant or a bundle, never both
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    #[serde(default)]
    pub variant_id: Option<i64>,
    #[serde(default)]
    pub bundle_id: Option<i64>,
    pub quantity: i64,
}

impl OrderItemRequest {
    pub fn variant(variant_id: i64, quantity: i64) -> Self {
        Self {
            variant_id: Some(variant_id),
            bundle_id: None,
            quantity,
        }
    }

    pub fn bundle(bundle_id: i64, quantity: i64) -> Self {
        Self {
            variant_id: None,
            bundle_id: Some(bundle_id),
            quantity,
        }
    }
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    #[serde(default)]
    pub shipping_method_id: Option<i64>,
    pub items: Vec<OrderItemRequest>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Cancel payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: String,
}

// =============================================================================
// Notifications
// =============================================================================

/// Fire-and-forget order event published to the notification collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderNotification {
    Created {
        order_id: i64,
        order_number: String,
        customer_id: i64,
    },
    StatusChanged {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },
    Cancelled {
        order_id: i64,
        reason: String,
    },
    RefundRequested {
        order_id: i64,
        refund_id: i64,
        organization_id: i64,
    },
    RefundResolved {
        order_id: i64,
        refund_id: i64,
        status: super::refund::RefundStatus,
    },
}

impl OrderNotification {
    pub fn order_id(&self) -> i64 {
        match self {
            Self::Created { order_id, .. }
            | Self::StatusChanged { order_id, .. }
            | Self::Cancelled { order_id, .. }
            | Self::RefundRequested { order_id, .. }
            | Self::RefundResolved { order_id, .. } => *order_id,
        }
    }
}
