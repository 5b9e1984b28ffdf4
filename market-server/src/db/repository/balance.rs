//! Vendor Balance Repository

use super::RepoResult;
use crate::utils::money::from_cents;
use shared::models::{
    BalanceField, ReferenceKind, TransactionType, VendorBalance, VendorBalanceTransaction,
};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct BalanceRow {
    pub organization_id: i64,
    pub available_balance: i64,
    pub pending_balance: i64,
    pub total_earnings: i64,
    pub total_paid_out: i64,
    pub updated_at: i64,
}

impl BalanceRow {
    pub fn field(&self, field: BalanceField) -> i64 {
        match field {
            BalanceField::Available => self.available_balance,
            BalanceField::Pending => self.pending_balance,
            BalanceField::TotalEarnings => self.total_earnings,
            BalanceField::TotalPaidOut => self.total_paid_out,
        }
    }

    pub fn into_model(self) -> VendorBalance {
        VendorBalance {
            organization_id: self.organization_id,
            available_balance: from_cents(self.available_balance),
            pending_balance: from_cents(self.pending_balance),
            total_earnings: from_cents(self.total_earnings),
            total_paid_out: from_cents(self.total_paid_out),
            updated_at: self.updated_at,
        }
    }
}

/// Signed change to each of the four fields, in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceDeltas {
    pub available: i64,
    pub pending: i64,
    pub earnings: i64,
    pub paid_out: i64,
}

impl BalanceDeltas {
    pub fn field(&self, field: BalanceField) -> i64 {
        match field {
            BalanceField::Available => self.available,
            BalanceField::Pending => self.pending,
            BalanceField::TotalEarnings => self.earnings,
            BalanceField::TotalPaidOut => self.paid_out,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub organization_id: i64,
    pub transaction_type: TransactionType,
    pub balance_field: BalanceField,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub reference_type: ReferenceKind,
    pub reference_id: i64,
    pub description: Option<String>,
    pub created_at: i64,
}

impl TransactionRow {
    pub fn into_model(self) -> VendorBalanceTransaction {
        VendorBalanceTransaction {
            id: self.id,
            organization_id: self.organization_id,
            transaction_type: self.transaction_type,
            balance_field: self.balance_field,
            amount: from_cents(self.amount),
            balance_before: from_cents(self.balance_before),
            balance_after: from_cents(self.balance_after),
            reference_type: self.reference_type,
            reference_id: self.reference_id,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

const BALANCE_COLUMNS: &str =
    "organization_id, available_balance, pending_balance, total_earnings, total_paid_out, updated_at";

/// Create the zeroed row on first use
pub async fn ensure(conn: &mut SqliteConnection, organization_id: i64, now: i64) -> RepoResult<()> {
    sqlx::query("INSERT OR IGNORE INTO vendor_balance (organization_id, updated_at) VALUES (?, ?)")
        .bind(organization_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn find(conn: &mut SqliteConnection, organization_id: i64) -> RepoResult<Option<BalanceRow>> {
    let sql = format!("SELECT {BALANCE_COLUMNS} FROM vendor_balance WHERE organization_id = ?");
    let row = sqlx::query_as::<_, BalanceRow>(&sql)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Apply all four deltas only if every field stays >= 0
pub async fn try_apply(
    conn: &mut SqliteConnection,
    organization_id: i64,
    deltas: BalanceDeltas,
    now: i64,
) -> RepoResult<Option<BalanceRow>> {
    let sql = format!(
        "UPDATE vendor_balance SET \
         available_balance = available_balance + ?, \
         pending_balance = pending_balance + ?, \
         total_earnings = total_earnings + ?, \
         total_paid_out = total_paid_out + ?, \
         updated_at = ? \
         WHERE organization_id = ? \
         AND available_balance + ? >= 0 AND pending_balance + ? >= 0 \
         AND total_earnings + ? >= 0 AND total_paid_out + ? >= 0 \
         RETURNING {BALANCE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, BalanceRow>(&sql)
        .bind(deltas.available)
        .bind(deltas.pending)
        .bind(deltas.earnings)
        .bind(deltas.paid_out)
        .bind(now)
        .bind(organization_id)
        .bind(deltas.available)
        .bind(deltas.pending)
        .bind(deltas.earnings)
        .bind(deltas.paid_out)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn insert_transaction(conn: &mut SqliteConnection, row: &TransactionRow) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO vendor_balance_transaction \
         (id, organization_id, transaction_type, balance_field, amount, balance_before, balance_after, \
          reference_type, reference_id, description, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(row.organization_id)
    .bind(row.transaction_type)
    .bind(row.balance_field)
    .bind(row.amount)
    .bind(row.balance_before)
    .bind(row.balance_after)
    .bind(row.reference_type)
    .bind(row.reference_id)
    .bind(&row.description)
    .bind(row.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Full log for one organization in the order it was written
pub async fn list_transactions(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> RepoResult<Vec<TransactionRow>> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        "SELECT id, organization_id, transaction_type, balance_field, amount, balance_before, \
         balance_after, reference_type, reference_id, description, created_at \
         FROM vendor_balance_transaction WHERE organization_id = ? ORDER BY created_at, rowid",
    )
    .bind(organization_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
