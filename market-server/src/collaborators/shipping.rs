use super::{CollaboratorError, CollaboratorResult, ShippingService};
use crate::db::repository::catalog;
use async_trait::async_trait;
use shared::models::ShippingMethod;
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SqlShipping {
    pool: SqlitePool,
}

impl SqlShipping {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShippingService for SqlShipping {
    async fn validate_method(&self, method_id: i64) -> CollaboratorResult<ShippingMethod> {
        let mut conn = self.pool.acquire().await?;
        let method = catalog::find_shipping_method(&mut conn, method_id)
            .await?
            .ok_or(CollaboratorError::NotFound {
                resource: "shipping method",
                id: method_id,
            })?;
        if !method.is_active {
            return Err(CollaboratorError::Inactive {
                resource: "shipping method",
                id: method_id,
            });
        }
        Ok(method)
    }
}
