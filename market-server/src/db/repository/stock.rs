//! Stock Repository
//!
//! Every mutation is a single conditional UPDATE; a `None` result means
//! the precondition in the WHERE clause did not hold (or the record does
//! not exist) and nothing was written.

use super::RepoResult;
use shared::models::{MovementReason, StockMovement, StockRecord};
use sqlx::SqliteConnection;

const RECORD_COLUMNS: &str = "variant_id, location_id, quantity, reserved, updated_at";

pub async fn find(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
) -> RepoResult<Option<StockRecord>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM stock_record WHERE variant_id = ? AND location_id = ?"
    );
    let record = sqlx::query_as::<_, StockRecord>(&sql)
        .bind(variant_id)
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// `reserved += qty` if `quantity - reserved >= qty`
pub async fn try_reserve(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
    now: i64,
) -> RepoResult<Option<StockRecord>> {
    let sql = format!(
        "UPDATE stock_record SET reserved = reserved + ?, updated_at = ? \
         WHERE variant_id = ? AND location_id = ? AND quantity - reserved >= ? \
         RETURNING {RECORD_COLUMNS}"
    );
    let record = sqlx::query_as::<_, StockRecord>(&sql)
        .bind(qty)
        .bind(now)
        .bind(variant_id)
        .bind(location_id)
        .bind(qty)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// `reserved -= qty` if `reserved >= qty`
pub async fn try_release(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
    now: i64,
) -> RepoResult<Option<StockRecord>> {
    let sql = format!(
        "UPDATE stock_record SET reserved = reserved - ?, updated_at = ? \
         WHERE variant_id = ? AND location_id = ? AND reserved >= ? \
         RETURNING {RECORD_COLUMNS}"
    );
    let record = sqlx::query_as::<_, StockRecord>(&sql)
        .bind(qty)
        .bind(now)
        .bind(variant_id)
        .bind(location_id)
        .bind(qty)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// `quantity -= qty, reserved -= qty` if both cover `qty`
pub async fn try_fulfill(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
    now: i64,
) -> RepoResult<Option<StockRecord>> {
    let sql = format!(
        "UPDATE stock_record SET quantity = quantity - ?, reserved = reserved - ?, updated_at = ? \
         WHERE variant_id = ? AND location_id = ? AND reserved >= ? AND quantity >= ? \
         RETURNING {RECORD_COLUMNS}"
    );
    let record = sqlx::query_as::<_, StockRecord>(&sql)
        .bind(qty)
        .bind(qty)
        .bind(now)
        .bind(variant_id)
        .bind(location_id)
        .bind(qty)
        .bind(qty)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// `quantity += delta` if the result still covers `reserved`
pub async fn try_adjust(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    delta: i64,
    now: i64,
) -> RepoResult<Option<StockRecord>> {
    let sql = format!(
        "UPDATE stock_record SET quantity = quantity + ?, updated_at = ? \
         WHERE variant_id = ? AND location_id = ? AND quantity + ? >= reserved \
         RETURNING {RECORD_COLUMNS}"
    );
    let record = sqlx::query_as::<_, StockRecord>(&sql)
        .bind(delta)
        .bind(now)
        .bind(variant_id)
        .bind(location_id)
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// Create the record with `quantity`, or add `quantity` to an existing one
pub async fn upsert_quantity(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    quantity: i64,
    now: i64,
) -> RepoResult<StockRecord> {
    let sql = format!(
        "INSERT INTO stock_record (variant_id, location_id, quantity, reserved, updated_at) \
         VALUES (?, ?, ?, 0, ?) \
         ON CONFLICT(variant_id, location_id) DO UPDATE SET \
         quantity = quantity + excluded.quantity, updated_at = excluded.updated_at \
         RETURNING {RECORD_COLUMNS}"
    );
    let record = sqlx::query_as::<_, StockRecord>(&sql)
        .bind(variant_id)
        .bind(location_id)
        .bind(quantity)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    Ok(record)
}

/// Append an audit row
pub async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO stock_movement (id, variant_id, location_id, delta, reason, order_id, note, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(movement.id)
    .bind(movement.variant_id)
    .bind(movement.location_id)
    .bind(movement.delta)
    .bind(movement.reason)
    .bind(movement.order_id)
    .bind(&movement.note)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn movements(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
) -> RepoResult<Vec<StockMovement>> {
    let rows = sqlx::query_as::<_, StockMovement>(
        "SELECT id, variant_id, location_id, delta, reason, order_id, note, created_at \
         FROM stock_movement WHERE variant_id = ? AND location_id = ? ORDER BY created_at, id",
    )
    .bind(variant_id)
    .bind(location_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Net reservation an order still holds per location for one variant,
/// derived from its reserve/release/fulfill movements.
pub async fn order_reservations(
    conn: &mut SqliteConnection,
    order_id: i64,
    variant_id: i64,
) -> RepoResult<Vec<(i64, i64)>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT location_id, SUM(delta) AS net FROM stock_movement \
         WHERE order_id = ? AND variant_id = ? AND reason IN (?, ?, ?) \
         GROUP BY location_id HAVING SUM(delta) > 0 ORDER BY location_id",
    )
    .bind(order_id)
    .bind(variant_id)
    .bind(MovementReason::Reserve)
    .bind(MovementReason::Release)
    .bind(MovementReason::Fulfill)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Active location with the most available stock that covers `qty`;
/// ties go to the lowest location id.
pub async fn best_location(
    conn: &mut SqliteConnection,
    variant_id: i64,
    qty: i64,
) -> RepoResult<Option<(i64, i64)>> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        "SELECT s.location_id, s.quantity - s.reserved AS available \
         FROM stock_record s JOIN location l ON l.id = s.location_id \
         WHERE s.variant_id = ? AND l.is_active = 1 AND s.quantity - s.reserved >= ? \
         ORDER BY available DESC, s.location_id ASC LIMIT 1",
    )
    .bind(variant_id)
    .bind(qty)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Sum of available stock across active locations
pub async fn total_available(conn: &mut SqliteConnection, variant_id: i64) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(s.quantity - s.reserved), 0) \
         FROM stock_record s JOIN location l ON l.id = s.location_id \
         WHERE s.variant_id = ? AND l.is_active = 1",
    )
    .bind(variant_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(total)
}
