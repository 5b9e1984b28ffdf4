//! Vendor Balance Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-organization running balances (derived cache of the transaction log)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorBalance {
    pub organization_id: i64,
    pub available_balance: Decimal,
    pub pending_balance: Decimal,
    pub total_earnings: Decimal,
    pub total_paid_out: Decimal,
    pub updated_at: i64,
}

impl VendorBalance {
    /// Zeroed balance for an organization that has no row yet
    pub fn empty(organization_id: i64) -> Self {
        Self {
            organization_id,
            available_balance: Decimal::ZERO,
            pending_balance: Decimal::ZERO,
            total_earnings: Decimal::ZERO,
            total_paid_out: Decimal::ZERO,
            updated_at: 0,
        }
    }

    pub fn field(&self, field: BalanceField) -> Decimal {
        match field {
            BalanceField::Available => self.available_balance,
            BalanceField::Pending => self.pending_balance,
            BalanceField::TotalEarnings => self.total_earnings,
            BalanceField::TotalPaidOut => self.total_paid_out,
        }
    }

    /// Same four totals, ignoring `updated_at`
    pub fn same_totals(&self, other: &VendorBalance) -> bool {
        self.available_balance == other.available_balance
            && self.pending_balance == other.pending_balance
            && self.total_earnings == other.total_earnings
            && self.total_paid_out == other.total_paid_out
    }
}

/// Ledger transaction type; `amount` is always positive, the sign is
/// implied by the type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TransactionType {
    Hold,
    Release,
    Refund,
    Credit,
    Debit,
    Payout,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Release => "release",
            Self::Refund => "refund",
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Payout => "payout",
        }
    }
}

/// Balance field a transaction row snapshots in `balance_before`/`balance_after`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum BalanceField {
    Available,
    Pending,
    TotalEarnings,
    TotalPaidOut,
}

impl BalanceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::TotalEarnings => "total_earnings",
            Self::TotalPaidOut => "total_paid_out",
        }
    }
}

/// What caused a ledger row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum ReferenceKind {
    Order,
    Refund,
    Payout,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Refund => "refund",
            Self::Payout => "payout",
        }
    }
}

/// Append-only ledger row (system of record)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorBalanceTransaction {
    pub id: i64,
    pub organization_id: i64,
    pub transaction_type: TransactionType,
    pub balance_field: BalanceField,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub reference_type: ReferenceKind,
    pub reference_id: i64,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Cached balance next to the fold of the transaction log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceReconciliation {
    pub organization_id: i64,
    pub cached: VendorBalance,
    pub folded: VendorBalance,
    pub transaction_count: usize,
    pub consistent: bool,
}
