//! Catalog Model
//!
//! Read-only snapshots the core receives from the catalog, bundle and
//! shipping collaborators. The core never writes these records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Organization type (drives the organization-type commission default)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrganizationType {
    Vendor,
    Logistics,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Logistics => "logistics",
        }
    }
}

/// Everything the order orchestrator needs to know about a sold variant.
///
/// All fields are populated by the catalog collaborator in one lookup;
/// there are no lazily loaded relations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantSnapshot {
    pub variant_id: i64,
    pub sku: String,
    /// Unit price in currency unit
    pub price: Decimal,
    /// ISO 4217 code
    pub currency: String,
    /// Unit weight in kilograms
    pub weight: Decimal,
    pub is_active: bool,
    pub product_id: i64,
    /// Primary category only (commission lookup ignores secondary categories)
    pub primary_category_id: Option<i64>,
    /// Owning vendor organization (fixed onto the order line at creation)
    pub organization_id: i64,
    pub organization_type: OrganizationType,
}

/// One component of a bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleComponent {
    pub variant_id: i64,
    /// Units of this variant per bundle
    pub quantity: i64,
    /// Component unit price inside the bundle
    pub unit_price: Decimal,
}

/// Shipping method as supplied by the shipping collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingMethod {
    pub id: i64,
    pub name: String,
    pub base_rate: Decimal,
    /// Added per kilogram of total order weight
    pub per_kg_rate: Decimal,
    /// Orders with a subtotal at or above this ship for free
    pub free_over: Option<Decimal>,
    pub is_active: bool,
}
