//! Catalog Repository
//!
//! Read side of the catalog, bundle, shipping and commission tables used
//! by the SQL-backed collaborators. Bundle reservation counters are the
//! only writes.

use super::RepoResult;
use crate::utils::money::{from_cents, grams_to_kg};
use shared::models::{
    BundleComponent, CommissionRule, CommissionScope, FeeType, OrganizationType, ShippingMethod,
    VariantSnapshot,
};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

#[derive(Debug, Clone, FromRow)]
pub struct VariantRow {
    pub variant_id: i64,
    pub sku: String,
    pub price: i64,
    pub currency: String,
    pub weight_grams: i64,
    pub is_active: bool,
    pub product_id: i64,
    pub primary_category_id: Option<i64>,
    pub organization_id: i64,
    pub organization_type: OrganizationType,
}

impl VariantRow {
    pub fn into_model(self) -> VariantSnapshot {
        VariantSnapshot {
            variant_id: self.variant_id,
            sku: self.sku,
            price: from_cents(self.price),
            currency: self.currency,
            weight: grams_to_kg(self.weight_grams),
            is_active: self.is_active,
            product_id: self.product_id,
            primary_category_id: self.primary_category_id,
            organization_id: self.organization_id,
            organization_type: self.organization_type,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CommissionRuleRow {
    pub id: i64,
    pub scope: CommissionScope,
    pub target_id: Option<i64>,
    pub organization_type: Option<OrganizationType>,
    pub fee_type: FeeType,
    pub rate: i64,
    pub is_active: bool,
}

impl CommissionRuleRow {
    pub fn into_model(self) -> CommissionRule {
        CommissionRule {
            id: self.id,
            scope: self.scope,
            target_id: self.target_id,
            organization_type: self.organization_type,
            fee_type: self.fee_type,
            // percentage rates and fixed amounts are both stored ×100
            rate: from_cents(self.rate),
            is_active: self.is_active,
        }
    }
}

/// Variant snapshots for the given ids; an inactive product or
/// organization makes the variant inactive.
pub async fn load_variants(conn: &mut SqliteConnection, ids: &[i64]) -> RepoResult<Vec<VariantRow>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT v.id AS variant_id, v.sku, v.price, v.currency, v.weight_grams, \
         (v.is_active = 1 AND p.is_active = 1 AND o.is_active = 1) AS is_active, \
         p.id AS product_id, p.primary_category_id, \
         o.id AS organization_id, o.organization_type \
         FROM variant v \
         JOIN product p ON p.id = v.product_id \
         JOIN organization o ON o.id = p.organization_id \
         WHERE v.id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY v.id");
    let rows = qb.build_query_as::<VariantRow>().fetch_all(&mut *conn).await?;
    Ok(rows)
}

/// All active rules, lowest id first
pub async fn load_commission_rules(conn: &mut SqliteConnection) -> RepoResult<Vec<CommissionRuleRow>> {
    let rows = sqlx::query_as::<_, CommissionRuleRow>(
        "SELECT id, scope, target_id, organization_type, fee_type, rate, is_active \
         FROM commission_rule WHERE is_active = 1 ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn organization_exists(conn: &mut SqliteConnection, organization_id: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM organization WHERE id = ?")
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

/// `(is_active)` of the bundle, `None` if it does not exist
pub async fn bundle_active(conn: &mut SqliteConnection, bundle_id: i64) -> RepoResult<Option<bool>> {
    let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM bundle WHERE id = ?")
        .bind(bundle_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(active)
}

pub async fn bundle_components(
    conn: &mut SqliteConnection,
    bundle_id: i64,
) -> RepoResult<Vec<BundleComponent>> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        "SELECT variant_id, quantity, unit_price FROM bundle_item WHERE bundle_id = ? ORDER BY variant_id",
    )
    .bind(bundle_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(variant_id, quantity, unit_price)| BundleComponent {
            variant_id,
            quantity,
            unit_price: from_cents(unit_price),
        })
        .collect())
}

/// `reserved_quantity += qty` while it stays within `max_quantity`
pub async fn try_reserve_bundle(conn: &mut SqliteConnection, bundle_id: i64, qty: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE bundle SET reserved_quantity = reserved_quantity + ? \
         WHERE id = ? AND is_active = 1 \
         AND (max_quantity IS NULL OR reserved_quantity + ? <= max_quantity)",
    )
    .bind(qty)
    .bind(bundle_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// `reserved_quantity -= qty`, floored at 0
pub async fn release_bundle(conn: &mut SqliteConnection, bundle_id: i64, qty: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE bundle SET reserved_quantity = MAX(reserved_quantity - ?, 0) WHERE id = ?",
    )
    .bind(qty)
    .bind(bundle_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find_shipping_method(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<ShippingMethod>> {
    let row: Option<(i64, String, i64, i64, Option<i64>, bool)> = sqlx::query_as(
        "SELECT id, name, base_rate, per_kg_rate, free_over, is_active FROM shipping_method WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(
        |(id, name, base_rate, per_kg_rate, free_over, is_active)| ShippingMethod {
            id,
            name,
            base_rate: from_cents(base_rate),
            per_kg_rate: from_cents(per_kg_rate),
            free_over: free_over.map(from_cents),
            is_active,
        },
    ))
}
