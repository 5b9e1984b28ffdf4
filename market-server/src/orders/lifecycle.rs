//! Status transitions and cancellation

use super::{OrderError, OrderResult, OrderService, transition_in, vendor_shares};
use crate::db::repository::order;
use crate::inventory::ledger::{fulfill_in, reservations_for_in};
use rust_decimal::Decimal;
use shared::models::{OrderDetail, OrderNotification, OrderStatus, UpdateOrderStatusRequest};
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

const DEFAULT_CANCEL_REASON: &str = "cancelled on request";

impl OrderService {
    /// Advance an order one step, or cancel it.
    ///
    /// `→ shipped` fulfills every line's reservation in the same
    /// transaction as the status change; `→ delivered` releases the vendor
    /// holds afterwards, logging per-vendor failures.
    pub async fn update_status(&self, order_id: i64, req: UpdateOrderStatusRequest) -> OrderResult<OrderDetail> {
        let current = self.get_order(order_id).await?.order.status;
        let to = req.status;

        if to == OrderStatus::Cancelled {
            let reason = req.reason.as_deref().unwrap_or(DEFAULT_CANCEL_REASON);
            return self.cancel(order_id, reason).await;
        }
        if !current.can_advance_to(to) {
            return Err(OrderError::InvalidState {
                order_id,
                from: current,
                to,
            });
        }

        let pool = &self.pool;
        let reason = req.reason.as_deref();
        self.retry
            .run("order.update_status", move || async move {
                let mut tx = pool.begin().await?;
                if to == OrderStatus::Shipped {
                    fulfill_reservations(&mut tx, order_id).await?;
                }
                transition_in(&mut tx, order_id, current, to, reason).await?;
                tx.commit().await?;
                Ok::<_, OrderError>(())
            })
            .await?;
        tracing::info!(order_id, from = %current, to = %to, "Order status changed");

        let detail = self.get_order(order_id).await?;
        if to == OrderStatus::Delivered {
            self.release_vendor_funds(&detail).await;
        }
        self.notify(OrderNotification::StatusChanged {
            order_id,
            from: current,
            to,
        });
        Ok(detail)
    }

    /// Cancel a `pending` or `processing` order, then release its stock,
    /// bundle reservations and vendor holds.
    pub async fn cancel(&self, order_id: i64, reason: &str) -> OrderResult<OrderDetail> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(OrderError::Validation("a cancellation reason is required".into()));
        }
        let detail = self.get_order(order_id).await?;
        let status = detail.order.status;
        if !status.can_cancel() {
            return Err(OrderError::InvalidStateFor {
                order_id,
                status,
                action: "cancel",
            });
        }

        let pool = &self.pool;
        let bundles = self
            .retry
            .run("order.cancel", move || async move {
                let mut tx = pool.begin().await?;
                transition_in(&mut tx, order_id, status, OrderStatus::Cancelled, Some(reason)).await?;
                let bundles = order::bundles_for_order(&mut tx, order_id).await?;
                tx.commit().await?;
                Ok::<_, OrderError>(bundles)
            })
            .await?;
        tracing::info!(order_id, from = %status, reason, "Order cancelled");

        let holds = vendor_shares(&detail.lines);
        self.unwind_effects(order_id, &detail.lines, &bundles, &holds).await;

        self.notify(OrderNotification::Cancelled {
            order_id,
            reason: reason.to_string(),
        });
        self.get_order(order_id).await
    }

    async fn release_vendor_funds(&self, detail: &OrderDetail) {
        let order_id = detail.order.id;
        for (organization_id, amount) in vendor_shares(&detail.lines) {
            if amount <= Decimal::ZERO {
                continue;
            }
            if let Err(e) = self.balance.release(organization_id, amount, order_id).await {
                tracing::error!(
                    order_id,
                    organization_id,
                    amount = %amount,
                    error = %e,
                    "Failed to release vendor funds"
                );
            }
        }
    }
}

/// Fulfill the order's reservations for every line; fails without side
/// effects if any variant is short.
async fn fulfill_reservations(conn: &mut SqliteConnection, order_id: i64) -> OrderResult<()> {
    let lines = order::lines_for_order(conn, order_id).await?;
    let mut needed: BTreeMap<i64, i64> = BTreeMap::new();
    for line in &lines {
        *needed.entry(line.variant_id).or_insert(0) += line.quantity;
    }

    for (variant_id, need) in needed {
        let held = reservations_for_in(conn, order_id, variant_id).await?;
        let total: i64 = held.iter().map(|(_, qty)| qty).sum();
        if total < need {
            return Err(OrderError::ReservationNotFound {
                order_id,
                variant_id,
                missing: need - total,
            });
        }
        let mut remaining = need;
        for (location_id, qty) in held {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(qty);
            fulfill_in(conn, variant_id, location_id, take, Some(order_id)).await?;
            remaining -= take;
        }
    }
    Ok(())
}
