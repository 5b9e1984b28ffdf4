//! Vendor Payout Repository

use super::RepoResult;
use crate::utils::money::from_cents;
use shared::models::{PayoutStatus, VendorPayout};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, FromRow)]
pub struct PayoutRow {
    pub id: i64,
    pub organization_id: i64,
    pub amount: i64,
    pub status: PayoutStatus,
    pub destination: String,
    pub external_reference: Option<String>,
    pub created_at: i64,
    pub processed_at: Option<i64>,
}

impl PayoutRow {
    pub fn into_model(self) -> VendorPayout {
        VendorPayout {
            id: self.id,
            organization_id: self.organization_id,
            amount: from_cents(self.amount),
            status: self.status,
            destination: self.destination,
            external_reference: self.external_reference,
            created_at: self.created_at,
            processed_at: self.processed_at,
        }
    }
}

const PAYOUT_COLUMNS: &str =
    "id, organization_id, amount, status, destination, external_reference, created_at, processed_at";

pub async fn insert(conn: &mut SqliteConnection, row: &PayoutRow) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO vendor_payout (id, organization_id, amount, status, destination, \
         external_reference, created_at, processed_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(row.organization_id)
    .bind(row.amount)
    .bind(row.status)
    .bind(&row.destination)
    .bind(&row.external_reference)
    .bind(row.created_at)
    .bind(row.processed_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<PayoutRow>> {
    let sql = format!("SELECT {PAYOUT_COLUMNS} FROM vendor_payout WHERE id = ?");
    let row = sqlx::query_as::<_, PayoutRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn list_for_organization(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> RepoResult<Vec<PayoutRow>> {
    let sql = format!(
        "SELECT {PAYOUT_COLUMNS} FROM vendor_payout WHERE organization_id = ? ORDER BY id DESC"
    );
    let rows = sqlx::query_as::<_, PayoutRow>(&sql)
        .bind(organization_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// `pending → processed`; false if it was already processed
pub async fn mark_processed(
    conn: &mut SqliteConnection,
    id: i64,
    external_reference: Option<&str>,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE vendor_payout SET status = ?, external_reference = ?, processed_at = ? \
         WHERE id = ? AND status = ?",
    )
    .bind(PayoutStatus::Processed)
    .bind(external_reference)
    .bind(now)
    .bind(id)
    .bind(PayoutStatus::Pending)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
