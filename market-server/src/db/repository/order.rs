//! Order Repository

use super::RepoResult;
use crate::utils::money::from_cents;
use shared::models::{
    CommissionSource, FeeType, Order, OrderLine, OrderStatus, OrderStatusHistory,
};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub currency: String,
    pub subtotal: i64,
    pub shipping_amount: i64,
    pub total: i64,
    pub platform_fee_total: i64,
    pub shipping_method_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OrderRow {
    pub fn into_model(self) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            status: self.status,
            currency: self.currency,
            subtotal: from_cents(self.subtotal),
            shipping_amount: from_cents(self.shipping_amount),
            total: from_cents(self.total),
            platform_fee_total: from_cents(self.platform_fee_total),
            shipping_method_id: self.shipping_method_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderLineRow {
    pub id: i64,
    pub order_id: i64,
    pub variant_id: i64,
    pub product_id: i64,
    pub organization_id: i64,
    pub location_id: i64,
    pub bundle_id: Option<i64>,
    pub sku: String,
    pub quantity: i64,
    pub refunded_quantity: i64,
    pub unit_price: i64,
    pub line_total: i64,
    pub fee_type: FeeType,
    pub fee_rate: i64,
    pub platform_fee_amount: i64,
    pub organization_amount: i64,
    pub commission_source: CommissionSource,
}

impl OrderLineRow {
    pub fn into_model(self) -> OrderLine {
        OrderLine {
            id: self.id,
            order_id: self.order_id,
            variant_id: self.variant_id,
            product_id: self.product_id,
            organization_id: self.organization_id,
            location_id: self.location_id,
            bundle_id: self.bundle_id,
            sku: self.sku,
            quantity: self.quantity,
            refunded_quantity: self.refunded_quantity,
            unit_price: from_cents(self.unit_price),
            line_total: from_cents(self.line_total),
            fee_type: self.fee_type,
            fee_rate: from_cents(self.fee_rate),
            platform_fee_amount: from_cents(self.platform_fee_amount),
            organization_amount: from_cents(self.organization_amount),
            commission_source: self.commission_source,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub order_id: i64,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub reason: Option<String>,
    pub created_at: i64,
}

impl HistoryRow {
    pub fn into_model(self) -> OrderStatusHistory {
        OrderStatusHistory {
            id: self.id,
            order_id: self.order_id,
            from_status: self.from_status,
            to_status: self.to_status,
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_id, status, currency, subtotal, \
     shipping_amount, total, platform_fee_total, shipping_method_id, created_at, updated_at";

const LINE_COLUMNS: &str = "id, order_id, variant_id, product_id, organization_id, location_id, \
     bundle_id, sku, quantity, refunded_quantity, unit_price, line_total, fee_type, fee_rate, \
     platform_fee_amount, organization_amount, commission_source";

pub async fn insert_order(conn: &mut SqliteConnection, row: &OrderRow) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, customer_id, status, currency, subtotal, \
         shipping_amount, total, platform_fee_total, shipping_method_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(&row.order_number)
    .bind(row.customer_id)
    .bind(row.status)
    .bind(&row.currency)
    .bind(row.subtotal)
    .bind(row.shipping_amount)
    .bind(row.total)
    .bind(row.platform_fee_total)
    .bind(row.shipping_method_id)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_line(conn: &mut SqliteConnection, row: &OrderLineRow) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_line (id, order_id, variant_id, product_id, organization_id, location_id, \
         bundle_id, sku, quantity, refunded_quantity, unit_price, line_total, fee_type, fee_rate, \
         platform_fee_amount, organization_amount, commission_source) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(row.order_id)
    .bind(row.variant_id)
    .bind(row.product_id)
    .bind(row.organization_id)
    .bind(row.location_id)
    .bind(row.bundle_id)
    .bind(&row.sku)
    .bind(row.quantity)
    .bind(row.refunded_quantity)
    .bind(row.unit_price)
    .bind(row.line_total)
    .bind(row.fee_type)
    .bind(row.fee_rate)
    .bind(row.platform_fee_amount)
    .bind(row.organization_amount)
    .bind(row.commission_source)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_history(
    conn: &mut SqliteConnection,
    order_id: i64,
    from_status: Option<OrderStatus>,
    to_status: OrderStatus,
    reason: Option<&str>,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_status_history (id, order_id, from_status, to_status, reason, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(order_id)
    .bind(from_status)
    .bind(to_status)
    .bind(reason)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Bundles requested by an order, kept so cancellation can release them
pub async fn insert_bundle(
    conn: &mut SqliteConnection,
    order_id: i64,
    bundle_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    sqlx::query("INSERT INTO order_bundle (order_id, bundle_id, quantity) VALUES (?, ?, ?)")
        .bind(order_id)
        .bind(bundle_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn find_order(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<OrderRow>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn lines_for_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderLineRow>> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM order_line WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderLineRow>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

pub async fn history_for_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<HistoryRow>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, order_id, from_status, to_status, reason, created_at \
         FROM order_status_history WHERE order_id = ? ORDER BY created_at, id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn bundles_for_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<(i64, i64)>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT bundle_id, quantity FROM order_bundle WHERE order_id = ? ORDER BY bundle_id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Move `from → to`; false when the order is no longer in `from`
pub async fn update_status_if(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(to)
        .bind(now)
        .bind(order_id)
        .bind(from)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Compare-and-set on `refunded_quantity`, bounded by `quantity`
pub async fn set_refunded_quantity_if(
    conn: &mut SqliteConnection,
    line_id: i64,
    expected: i64,
    new_value: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE order_line SET refunded_quantity = ? \
         WHERE id = ? AND refunded_quantity = ? AND ? >= 0 AND ? <= quantity",
    )
    .bind(new_value)
    .bind(line_id)
    .bind(expected)
    .bind(new_value)
    .bind(new_value)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Give back refunded units when a refund is rejected or cancelled
pub async fn decrement_refunded(conn: &mut SqliteConnection, line_id: i64, qty: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE order_line SET refunded_quantity = refunded_quantity - ? \
         WHERE id = ? AND refunded_quantity >= ?",
    )
    .bind(qty)
    .bind(line_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find_line(conn: &mut SqliteConnection, line_id: i64) -> RepoResult<Option<OrderLineRow>> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM order_line WHERE id = ?");
    let row = sqlx::query_as::<_, OrderLineRow>(&sql)
        .bind(line_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}
