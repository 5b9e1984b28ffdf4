//! Test fixtures: a migrated SQLite database in a temp dir plus seed
//! helpers for the catalog tables the core only reads.

use super::DbService;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub struct TestDb {
    // dropped last; removes the database file
    _dir: TempDir,
    pub db: DbService,
}

impl TestDb {
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}

pub async fn test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("market.db");
    let db = DbService::new(path.to_str().unwrap()).await.unwrap();
    TestDb { _dir: dir, db }
}

pub async fn organization(pool: &SqlitePool, id: i64, organization_type: &str) {
    sqlx::query("INSERT INTO organization (id, name, organization_type) VALUES (?, ?, ?)")
        .bind(id)
        .bind(format!("org-{id}"))
        .bind(organization_type)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn category(pool: &SqlitePool, id: i64) {
    sqlx::query("INSERT INTO category (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(format!("category-{id}"))
        .execute(pool)
        .await
        .unwrap();
}

pub async fn product(pool: &SqlitePool, id: i64, organization_id: i64, category_id: Option<i64>) {
    sqlx::query("INSERT INTO product (id, organization_id, primary_category_id, name) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(organization_id)
        .bind(category_id)
        .bind(format!("product-{id}"))
        .execute(pool)
        .await
        .unwrap();
}

pub async fn variant(pool: &SqlitePool, id: i64, product_id: i64, price_cents: i64, weight_grams: i64) {
    sqlx::query(
        "INSERT INTO variant (id, product_id, sku, price, currency, weight_grams) VALUES (?, ?, ?, ?, 'USD', ?)",
    )
    .bind(id)
    .bind(product_id)
    .bind(format!("SKU-{id}"))
    .bind(price_cents)
    .bind(weight_grams)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn location(pool: &SqlitePool, id: i64, organization_id: i64) {
    sqlx::query("INSERT INTO location (id, organization_id, name) VALUES (?, ?, ?)")
        .bind(id)
        .bind(organization_id)
        .bind(format!("location-{id}"))
        .execute(pool)
        .await
        .unwrap();
}

pub async fn stock(pool: &SqlitePool, variant_id: i64, location_id: i64, quantity: i64, reserved: i64) {
    sqlx::query(
        "INSERT INTO stock_record (variant_id, location_id, quantity, reserved, updated_at) VALUES (?, ?, ?, ?, 0)",
    )
    .bind(variant_id)
    .bind(location_id)
    .bind(quantity)
    .bind(reserved)
    .execute(pool)
    .await
    .unwrap();
}

/// `rate` is ×100: 1500 = 15% for percentage rules, 1500 = $15 for fixed
pub async fn commission_rule(
    pool: &SqlitePool,
    id: i64,
    scope: &str,
    target_id: Option<i64>,
    organization_type: Option<&str>,
    fee_type: &str,
    rate: i64,
) {
    sqlx::query(
        "INSERT INTO commission_rule (id, scope, target_id, organization_type, fee_type, rate) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(scope)
    .bind(target_id)
    .bind(organization_type)
    .bind(fee_type)
    .bind(rate)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn shipping_method(
    pool: &SqlitePool,
    id: i64,
    base_cents: i64,
    per_kg_cents: i64,
    free_over_cents: Option<i64>,
    is_active: bool,
) {
    sqlx::query(
        "INSERT INTO shipping_method (id, name, base_rate, per_kg_rate, free_over, is_active) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(format!("shipping-{id}"))
    .bind(base_cents)
    .bind(per_kg_cents)
    .bind(free_over_cents)
    .bind(is_active)
    .execute(pool)
    .await
    .unwrap();
}

/// `items`: `(variant_id, quantity per bundle, unit price cents)`
pub async fn bundle(pool: &SqlitePool, id: i64, max_quantity: Option<i64>, items: &[(i64, i64, i64)]) {
    sqlx::query("INSERT INTO bundle (id, name, max_quantity) VALUES (?, ?, ?)")
        .bind(id)
        .bind(format!("bundle-{id}"))
        .bind(max_quantity)
        .execute(pool)
        .await
        .unwrap();
    for &(variant_id, quantity, unit_price) in items {
        sqlx::query("INSERT INTO bundle_item (bundle_id, variant_id, quantity, unit_price) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(variant_id)
            .bind(quantity)
            .bind(unit_price)
            .execute(pool)
            .await
            .unwrap();
    }
}

/// Vendor `org_id` selling one variant from one location.
///
/// Ids: product = `variant_id`, location = `variant_id`.
pub async fn vendor_variant(
    pool: &SqlitePool,
    org_id: i64,
    variant_id: i64,
    price_cents: i64,
    quantity: i64,
) {
    sqlx::query("INSERT OR IGNORE INTO organization (id, name, organization_type) VALUES (?, ?, 'vendor')")
        .bind(org_id)
        .bind(format!("org-{org_id}"))
        .execute(pool)
        .await
        .unwrap();
    product(pool, variant_id, org_id, None).await;
    variant(pool, variant_id, variant_id, price_cents, 500).await;
    location(pool, variant_id, org_id).await;
    stock(pool, variant_id, variant_id, quantity, 0).await;
}
