//! Commission Model

use super::catalog::OrganizationType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum FeeType {
    /// `rate` is a percentage of the line total (15 = 15%)
    Percentage,
    /// `rate` is a flat amount per line
    Fixed,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

/// Which level of the commission hierarchy produced a split
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum CommissionSource {
    Product,
    Category,
    Vendor,
    OrganizationType,
    /// Nothing configured: 0% fee, vendor keeps the whole line
    None,
}

impl CommissionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Category => "category",
            Self::Vendor => "vendor",
            Self::OrganizationType => "organization_type",
            Self::None => "none",
        }
    }
}

/// Scope a stored commission rule applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum CommissionScope {
    Product,
    Category,
    Vendor,
    OrganizationType,
}

/// A single fee configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeeRule {
    pub fee_type: FeeType,
    pub rate: Decimal,
}

impl FeeRule {
    pub fn percentage(rate: Decimal) -> Self {
        Self {
            fee_type: FeeType::Percentage,
            rate,
        }
    }

    pub fn fixed(amount: Decimal) -> Self {
        Self {
            fee_type: FeeType::Fixed,
            rate: amount,
        }
    }
}

/// Snapshot of every level of the hierarchy that applies to one line
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeeHierarchy {
    pub product: Option<FeeRule>,
    /// Primary category override
    pub category: Option<FeeRule>,
    pub vendor: Option<FeeRule>,
    pub organization_type: Option<FeeRule>,
}

/// Resolved platform/vendor split for one line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionSplit {
    pub fee_type: FeeType,
    pub fee_rate: Decimal,
    pub platform_fee_amount: Decimal,
    pub organization_amount: Decimal,
    pub source: CommissionSource,
}

/// Stored commission rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: i64,
    pub scope: CommissionScope,
    /// Product, category or organization id depending on `scope`
    pub target_id: Option<i64>,
    /// Set only for `OrganizationType` scope
    pub organization_type: Option<OrganizationType>,
    pub fee_type: FeeType,
    pub rate: Decimal,
    pub is_active: bool,
}
