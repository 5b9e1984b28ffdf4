//! Order Orchestrator
//!
//! Drives the order lifecycle across the inventory and balance ledgers:
//!
//! - `create_order`: resolve locations, persist order + lines + holds in
//!   one transaction, then reserve stock outside it (compensated on
//!   failure)
//! - `update_status` / `cancel`: the `pending → processing → shipped →
//!   delivered` machine with fulfillment, fund release and unwinds
//! - refunds: per-vendor refunds with their own state machine
//!
//! Post-commit effects (reservation unwind, fund release, cancellation
//! refunds) log failures instead of returning them.

mod create;
pub mod error;
mod lifecycle;
mod refunds;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};

use crate::balance::BalanceLedger;
use crate::collaborators::{
    BundleService, CatalogProvider, Notifier, OrderEventBus, ShippingService, SqlBundles, SqlCatalog,
    SqlShipping,
};
use crate::db::RetryPolicy;
use crate::db::repository::order::{self, HistoryRow, OrderLineRow};
use crate::inventory::InventoryLedger;
use rust_decimal::Decimal;
use shared::models::{OrderDetail, OrderLine, OrderNotification, OrderStatus};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use std::sync::Arc;

/// External services the orchestrator calls
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogProvider>,
    pub bundles: Arc<dyn BundleService>,
    pub shipping: Arc<dyn ShippingService>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// SQL-backed catalog, bundles and shipping; notifications on `events`
    pub fn sql(pool: &SqlitePool, events: OrderEventBus) -> Self {
        Self {
            catalog: Arc::new(SqlCatalog::new(pool.clone())),
            bundles: Arc::new(SqlBundles::new(pool.clone())),
            shipping: Arc::new(SqlShipping::new(pool.clone())),
            notifier: Arc::new(events),
        }
    }
}

pub struct OrderService {
    pool: SqlitePool,
    retry: RetryPolicy,
    inventory: InventoryLedger,
    balance: BalanceLedger,
    catalog: Arc<dyn CatalogProvider>,
    bundles: Arc<dyn BundleService>,
    shipping: Arc<dyn ShippingService>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("retry", &self.retry)
            .field("collaborators", &"<dyn>")
            .finish()
    }
}

impl OrderService {
    pub fn new(
        pool: SqlitePool,
        retry: RetryPolicy,
        inventory: InventoryLedger,
        balance: BalanceLedger,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            pool,
            retry,
            inventory,
            balance,
            catalog: collaborators.catalog,
            bundles: collaborators.bundles,
            shipping: collaborators.shipping,
            notifier: collaborators.notifier,
        }
    }

    /// Order with its lines and status history
    pub async fn get_order(&self, order_id: i64) -> OrderResult<OrderDetail> {
        let mut conn = self.pool.acquire().await?;
        load_detail(&mut conn, order_id).await
    }

    fn notify(&self, notification: OrderNotification) {
        self.notifier.notify(notification);
    }

    /// Release whatever stock the order still holds, the given bundle
    /// reservations and the per-organization holds. Failures are logged.
    async fn unwind_effects(
        &self,
        order_id: i64,
        lines: &[OrderLine],
        bundles: &[(i64, i64)],
        holds: &BTreeMap<i64, Decimal>,
    ) {
        let mut variants: Vec<i64> = lines.iter().map(|l| l.variant_id).collect();
        variants.sort_unstable();
        variants.dedup();

        for variant_id in variants {
            let held = match self.inventory.reservations_for(order_id, variant_id).await {
                Ok(held) => held,
                Err(e) => {
                    tracing::error!(order_id, variant_id, error = %e, "Failed to read reservations during unwind");
                    continue;
                }
            };
            for (location_id, qty) in held {
                if let Err(e) = self
                    .inventory
                    .release(variant_id, location_id, qty, Some(order_id))
                    .await
                {
                    tracing::error!(
                        order_id,
                        variant_id,
                        location_id,
                        qty,
                        error = %e,
                        "Failed to release reservation"
                    );
                }
            }
        }

        for &(bundle_id, qty) in bundles {
            if let Err(e) = self.bundles.release(bundle_id, qty, order_id).await {
                tracing::error!(order_id, bundle_id, qty, error = %e, "Failed to release bundle reservation");
            }
        }

        for (&organization_id, &amount) in holds {
            if amount <= Decimal::ZERO {
                continue;
            }
            if let Err(e) = self.balance.refund_funds(organization_id, amount, order_id).await {
                tracing::error!(
                    order_id,
                    organization_id,
                    amount = %amount,
                    error = %e,
                    "Failed to refund held funds, manual reconciliation required"
                );
            }
        }
    }
}

/// Σ `organization_amount` per organization
pub(crate) fn vendor_shares(lines: &[OrderLine]) -> BTreeMap<i64, Decimal> {
    let mut shares = BTreeMap::new();
    for line in lines {
        *shares.entry(line.organization_id).or_insert(Decimal::ZERO) += line.organization_amount;
    }
    shares
}

async fn load_detail(conn: &mut SqliteConnection, order_id: i64) -> OrderResult<OrderDetail> {
    let order = order::find_order(conn, order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))?
        .into_model();
    let lines = order::lines_for_order(conn, order_id)
        .await?
        .into_iter()
        .map(OrderLineRow::into_model)
        .collect();
    let history = order::history_for_order(conn, order_id)
        .await?
        .into_iter()
        .map(HistoryRow::into_model)
        .collect();
    Ok(OrderDetail {
        order,
        lines,
        history,
    })
}

/// Conditional status change plus its history row
async fn transition_in(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    reason: Option<&str>,
) -> OrderResult<()> {
    let now = now_millis();
    if !order::update_status_if(conn, order_id, from, to, now).await? {
        return Err(OrderError::InvalidState { order_id, from, to });
    }
    order::insert_history(conn, order_id, Some(from), to, reason, now).await?;
    Ok(())
}
