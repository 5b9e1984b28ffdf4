//! SQL-backed catalog and bundle collaborators

use super::{BundleService, CatalogProvider, CollaboratorError, CollaboratorResult};
use crate::db::repository::catalog;
use async_trait::async_trait;
use shared::models::{BundleComponent, VariantSnapshot};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SqlCatalog {
    pool: SqlitePool,
}

impl SqlCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogProvider for SqlCatalog {
    async fn load_variants(&self, ids: &[i64]) -> CollaboratorResult<Vec<VariantSnapshot>> {
        let mut conn = self.pool.acquire().await?;
        let rows = catalog::load_variants(&mut conn, ids).await?;
        Ok(rows.into_iter().map(catalog::VariantRow::into_model).collect())
    }
}

/// Bundles as a conditional `reserved_quantity` counter on the bundle row
#[derive(Debug, Clone)]
pub struct SqlBundles {
    pool: SqlitePool,
}

impl SqlBundles {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BundleService for SqlBundles {
    async fn components(&self, bundle_id: i64) -> CollaboratorResult<Vec<BundleComponent>> {
        let mut conn = self.pool.acquire().await?;
        match catalog::bundle_active(&mut conn, bundle_id).await? {
            None => Err(CollaboratorError::NotFound {
                resource: "bundle",
                id: bundle_id,
            }),
            Some(false) => Err(CollaboratorError::Inactive {
                resource: "bundle",
                id: bundle_id,
            }),
            Some(true) => Ok(catalog::bundle_components(&mut conn, bundle_id).await?),
        }
    }

    async fn reserve(&self, bundle_id: i64, qty: i64, order_id: i64) -> CollaboratorResult<()> {
        let mut conn = self.pool.acquire().await?;
        if !catalog::try_reserve_bundle(&mut conn, bundle_id, qty).await? {
            return Err(CollaboratorError::BundleUnavailable {
                bundle_id,
                requested: qty,
            });
        }
        tracing::debug!(bundle_id, qty, order_id, "Bundle reserved");
        Ok(())
    }

    async fn release(&self, bundle_id: i64, qty: i64, order_id: i64) -> CollaboratorResult<()> {
        let mut conn = self.pool.acquire().await?;
        if !catalog::release_bundle(&mut conn, bundle_id, qty).await? {
            return Err(CollaboratorError::NotFound {
                resource: "bundle",
                id: bundle_id,
            });
        }
        tracing::debug!(bundle_id, qty, order_id, "Bundle released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    #[tokio::test]
    async fn test_load_variants_snapshot() {
        let t = fixtures::test_db().await;
        fixtures::vendor_variant(t.pool(), 1, 11, 2_550, 5).await;
        let catalog = SqlCatalog::new(t.pool().clone());

        let variants = catalog.load_variants(&[11, 999]).await.unwrap();
        assert_eq!(variants.len(), 1);
        let v = &variants[0];
        assert_eq!(v.sku, "SKU-11");
        assert_eq!(v.price, "25.50".parse().unwrap());
        assert_eq!(v.weight, "0.5".parse().unwrap());
        assert_eq!(v.organization_id, 1);
        assert!(v.is_active);

        sqlx::query("UPDATE organization SET is_active = 0 WHERE id = 1")
            .execute(t.pool())
            .await
            .unwrap();
        assert!(!catalog.load_variants(&[11]).await.unwrap()[0].is_active);
    }

    #[tokio::test]
    async fn test_bundle_cap() {
        let t = fixtures::test_db().await;
        fixtures::vendor_variant(t.pool(), 1, 11, 1_000, 50).await;
        fixtures::bundle(t.pool(), 5, Some(3), &[(11, 2, 900)]).await;
        let bundles = SqlBundles::new(t.pool().clone());

        let components = bundles.components(5).await.unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].quantity, 2);
        assert_eq!(components[0].unit_price, "9.00".parse().unwrap());

        bundles.reserve(5, 2, 100).await.unwrap();
        let err = bundles.reserve(5, 2, 101).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::BundleUnavailable { bundle_id: 5, .. }));
        bundles.release(5, 2, 100).await.unwrap();
        bundles.reserve(5, 3, 101).await.unwrap();

        assert!(matches!(
            bundles.components(6).await.unwrap_err(),
            CollaboratorError::NotFound { resource: "bundle", .. }
        ));
    }
}
