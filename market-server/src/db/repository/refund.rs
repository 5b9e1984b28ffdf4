//! Refund Repository

use super::RepoResult;
use crate::utils::money::from_cents;
use shared::models::{Refund, RefundItem, RefundStatus};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, FromRow)]
pub struct RefundRow {
    pub id: i64,
    pub order_id: i64,
    pub organization_id: i64,
    pub status: RefundStatus,
    pub amount: i64,
    pub organization_amount: i64,
    pub platform_fee_amount: i64,
    pub reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl RefundRow {
    pub fn into_model(self) -> Refund {
        Refund {
            id: self.id,
            order_id: self.order_id,
            organization_id: self.organization_id,
            status: self.status,
            amount: from_cents(self.amount),
            organization_amount: from_cents(self.organization_amount),
            platform_fee_amount: from_cents(self.platform_fee_amount),
            reason: self.reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RefundItemRow {
    pub id: i64,
    pub refund_id: i64,
    pub order_line_id: i64,
    pub variant_id: i64,
    pub quantity: i64,
    pub amount: i64,
    pub organization_amount: i64,
}

impl RefundItemRow {
    pub fn into_model(self) -> RefundItem {
        RefundItem {
            id: self.id,
            refund_id: self.refund_id,
            order_line_id: self.order_line_id,
            variant_id: self.variant_id,
            quantity: self.quantity,
            amount: from_cents(self.amount),
            organization_amount: from_cents(self.organization_amount),
        }
    }
}

const REFUND_COLUMNS: &str = "id, order_id, organization_id, status, amount, organization_amount, \
     platform_fee_amount, reason, created_at, updated_at";

pub async fn insert_refund(conn: &mut SqliteConnection, row: &RefundRow) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO refund (id, order_id, organization_id, status, amount, organization_amount, \
         platform_fee_amount, reason, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(row.order_id)
    .bind(row.organization_id)
    .bind(row.status)
    .bind(row.amount)
    .bind(row.organization_amount)
    .bind(row.platform_fee_amount)
    .bind(&row.reason)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_item(conn: &mut SqliteConnection, row: &RefundItemRow) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO refund_item (id, refund_id, order_line_id, variant_id, quantity, amount, organization_amount) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(row.refund_id)
    .bind(row.order_line_id)
    .bind(row.variant_id)
    .bind(row.quantity)
    .bind(row.amount)
    .bind(row.organization_amount)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_refund(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<RefundRow>> {
    let sql = format!("SELECT {REFUND_COLUMNS} FROM refund WHERE id = ?");
    let row = sqlx::query_as::<_, RefundRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn items_for_refund(conn: &mut SqliteConnection, refund_id: i64) -> RepoResult<Vec<RefundItemRow>> {
    let rows = sqlx::query_as::<_, RefundItemRow>(
        "SELECT id, refund_id, order_line_id, variant_id, quantity, amount, organization_amount \
         FROM refund_item WHERE refund_id = ? ORDER BY id",
    )
    .bind(refund_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn refunds_for_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<RefundRow>> {
    let sql = format!("SELECT {REFUND_COLUMNS} FROM refund WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, RefundRow>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Move `from → to`; false when the refund is no longer in `from`
pub async fn update_status_if(
    conn: &mut SqliteConnection,
    refund_id: i64,
    from: RefundStatus,
    to: RefundStatus,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE refund SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(to)
        .bind(now)
        .bind(refund_id)
        .bind(from)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Number of lines of the order not yet covered by completed refunds
pub async fn lines_not_fully_refunded(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM order_line ol WHERE ol.order_id = ? AND ol.quantity > COALESCE(( \
             SELECT SUM(ri.quantity) FROM refund_item ri JOIN refund r ON r.id = ri.refund_id \
             WHERE ri.order_line_id = ol.id AND r.status = ?), 0)",
    )
    .bind(order_id)
    .bind(RefundStatus::Completed)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}
