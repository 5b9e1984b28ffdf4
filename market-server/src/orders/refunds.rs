//! Per-vendor refunds
//!
//! A refund request is split by vendor organization; each vendor's refund
//! is created in its own transaction together with the debit of its
//! share, so one vendor's insufficient balance does not block the others.

use super::{OrderError, OrderResult, OrderService};
use crate::balance::{BalanceOp, apply_in};
use crate::db::repository::RepoError;
use crate::db::repository::order::{self, OrderLineRow};
use crate::db::repository::refund::{self, RefundItemRow, RefundRow};
use crate::inventory::ledger::restock_in;
use crate::utils::money::{from_cents, prorate, to_cents};
use shared::error::AppError;
use shared::models::{
    CreateRefundRequest, OrderNotification, OrderStatus, ReferenceKind, RefundBatch, RefundDetail,
    RefundFailure, RefundStatus,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

const ALL_LINES_REFUNDED: &str = "all lines refunded";

/// Refund amounts for `qty` more units of a line that already has
/// `line.refunded_quantity` refunded, as the difference of cumulative
/// prorations so repeated partial refunds add up to the line exactly.
fn refund_share(line: &OrderLineRow, qty: i64) -> Result<(i64, i64), OrderError> {
    let before = line.refunded_quantity;
    let after = before + qty;
    let slice = |total: i64| {
        let total = from_cents(total);
        prorate(total, after, line.quantity) - prorate(total, before, line.quantity)
    };
    Ok((to_cents(slice(line.line_total))?, to_cents(slice(line.organization_amount))?))
}

async fn load_refund(conn: &mut SqliteConnection, refund_id: i64) -> OrderResult<RefundDetail> {
    let refund = refund::find_refund(conn, refund_id)
        .await?
        .ok_or(OrderError::RefundNotFound(refund_id))?
        .into_model();
    let items = refund::items_for_refund(conn, refund_id)
        .await?
        .into_iter()
        .map(RefundItemRow::into_model)
        .collect();
    Ok(RefundDetail { refund, items })
}

/// Insert one vendor's refund, bump the lines' refunded counters and
/// debit the vendor share.
async fn create_vendor_refund_in(
    conn: &mut SqliteConnection,
    order_id: i64,
    organization_id: i64,
    items: &[(i64, i64)],
    reason: Option<&str>,
) -> OrderResult<RefundDetail> {
    let refund_id = snowflake_id();
    let now = now_millis();

    let mut item_rows = Vec::with_capacity(items.len());
    let mut counters = Vec::with_capacity(items.len());
    let (mut amount, mut organization_amount) = (0i64, 0i64);
    for &(line_id, qty) in items {
        let line = order::find_line(conn, line_id)
            .await?
            .filter(|l| l.order_id == order_id)
            .ok_or(OrderError::LineNotFound { order_id, line_id })?;
        let refundable = line.quantity - line.refunded_quantity;
        if qty > refundable {
            return Err(OrderError::RefundExceedsQuantity {
                line_id,
                requested: qty,
                refundable,
            });
        }
        let (line_amount, line_org_amount) = refund_share(&line, qty)?;
        amount += line_amount;
        organization_amount += line_org_amount;
        counters.push((line_id, line.refunded_quantity, line.refunded_quantity + qty, refundable));
        item_rows.push(RefundItemRow {
            id: snowflake_id(),
            refund_id,
            order_line_id: line_id,
            variant_id: line.variant_id,
            quantity: qty,
            amount: line_amount,
            organization_amount: line_org_amount,
        });
    }

    let row = RefundRow {
        id: refund_id,
        order_id,
        organization_id,
        status: RefundStatus::Requested,
        amount,
        organization_amount,
        platform_fee_amount: amount - organization_amount,
        reason: reason.map(str::to_string),
        created_at: now,
        updated_at: now,
    };
    refund::insert_refund(conn, &row).await?;
    for item in &item_rows {
        refund::insert_item(conn, item).await?;
    }
    for (i, &(line_id, expected, new_value, refundable)) in counters.iter().enumerate() {
        if !order::set_refunded_quantity_if(conn, line_id, expected, new_value).await? {
            return Err(OrderError::RefundExceedsQuantity {
                line_id,
                requested: item_rows[i].quantity,
                refundable,
            });
        }
    }
    if organization_amount > 0 {
        apply_in(
            conn,
            organization_id,
            BalanceOp::DebitForRefund,
            from_cents(organization_amount),
            ReferenceKind::Refund,
            refund_id,
            reason,
        )
        .await?;
    }

    Ok(RefundDetail {
        refund: row.into_model(),
        items: item_rows.into_iter().map(RefundItemRow::into_model).collect(),
    })
}

impl OrderService {
    /// Request refunds for delivered order lines, one refund per vendor.
    ///
    /// Vendors succeed or fail independently; failures are reported in the
    /// batch. If no vendor's refund could be created the first error is
    /// returned instead.
    pub async fn request_refund(&self, order_id: i64, req: CreateRefundRequest) -> OrderResult<RefundBatch> {
        if req.items.is_empty() {
            return Err(OrderError::Validation("refund needs at least one item".into()));
        }
        let mut requested: BTreeMap<i64, i64> = BTreeMap::new();
        for item in &req.items {
            if item.quantity <= 0 {
                return Err(OrderError::Validation(format!(
                    "refund quantity must be positive, got {}",
                    item.quantity
                )));
            }
            *requested.entry(item.order_line_id).or_insert(0) += item.quantity;
        }

        let detail = self.get_order(order_id).await?;
        if detail.order.status != OrderStatus::Delivered {
            return Err(OrderError::InvalidStateFor {
                order_id,
                status: detail.order.status,
                action: "refund",
            });
        }

        let mut by_vendor: BTreeMap<i64, Vec<(i64, i64)>> = BTreeMap::new();
        for (&line_id, &qty) in &requested {
            let line = detail
                .lines
                .iter()
                .find(|l| l.id == line_id)
                .ok_or(OrderError::LineNotFound { order_id, line_id })?;
            if qty > line.refundable_quantity() {
                return Err(OrderError::RefundExceedsQuantity {
                    line_id,
                    requested: qty,
                    refundable: line.refundable_quantity(),
                });
            }
            by_vendor.entry(line.organization_id).or_default().push((line_id, qty));
        }

        let reason = req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let mut batch = RefundBatch::default();
        let mut errors = Vec::new();
        for (organization_id, items) in by_vendor {
            let pool = &self.pool;
            let items = items.as_slice();
            let result = self
                .retry
                .run("refund.create", move || async move {
                    let mut tx = pool.begin().await?;
                    let detail = create_vendor_refund_in(&mut tx, order_id, organization_id, items, reason).await?;
                    tx.commit().await?;
                    Ok::<_, OrderError>(detail)
                })
                .await;
            match result {
                Ok(refund) => {
                    tracing::info!(
                        order_id,
                        organization_id,
                        refund_id = refund.refund.id,
                        amount = %refund.refund.amount,
                        "Refund requested"
                    );
                    self.notify(OrderNotification::RefundRequested {
                        order_id,
                        refund_id: refund.refund.id,
                        organization_id,
                    });
                    batch.created.push(refund);
                }
                Err(e) => {
                    tracing::warn!(order_id, organization_id, error = %e, "Vendor refund could not be created");
                    errors.push((organization_id, e));
                }
            }
        }

        if batch.created.is_empty() && !errors.is_empty() {
            let (_, first) = errors.remove(0);
            return Err(first);
        }
        batch.failures = errors
            .into_iter()
            .map(|(organization_id, e)| {
                let err = AppError::from(e);
                RefundFailure {
                    organization_id,
                    code: err.code.code(),
                    message: err.message,
                }
            })
            .collect();
        Ok(batch)
    }

    /// `requested → approved`; payment reversal happens out of band
    pub async fn approve_refund(&self, refund_id: i64) -> OrderResult<RefundDetail> {
        self.resolve_refund(refund_id, RefundStatus::Approved, false).await
    }

    /// `requested → rejected`; the vendor share is credited back
    pub async fn reject_refund(&self, refund_id: i64) -> OrderResult<RefundDetail> {
        self.resolve_refund(refund_id, RefundStatus::Rejected, false).await
    }

    /// `requested|approved → cancelled`; the vendor share is credited back
    pub async fn cancel_refund(&self, refund_id: i64) -> OrderResult<RefundDetail> {
        self.resolve_refund(refund_id, RefundStatus::Cancelled, false).await
    }

    /// `approved → completed`, optionally returning the units to stock.
    /// Completing the last open line moves the order to `refunded`.
    pub async fn complete_refund(&self, refund_id: i64, restock: bool) -> OrderResult<RefundDetail> {
        self.resolve_refund(refund_id, RefundStatus::Completed, restock).await
    }

    async fn resolve_refund(&self, refund_id: i64, to: RefundStatus, restock: bool) -> OrderResult<RefundDetail> {
        let pool = &self.pool;
        let (detail, from, order_refunded) = self
            .retry
            .run("refund.resolve", move || async move {
                let mut tx = pool.begin().await?;
                let current = refund::find_refund(&mut tx, refund_id)
                    .await?
                    .ok_or(OrderError::RefundNotFound(refund_id))?;
                let from = current.status;
                if !from.can_transition_to(to)
                    || !refund::update_status_if(&mut tx, refund_id, from, to, now_millis()).await?
                {
                    return Err(OrderError::RefundInvalidState { refund_id, from, to });
                }
                let items = refund::items_for_refund(&mut tx, refund_id).await?;

                if to.reverses_debit() {
                    for item in &items {
                        if !order::decrement_refunded(&mut tx, item.order_line_id, item.quantity).await? {
                            return Err(OrderError::Repo(RepoError::Validation(format!(
                                "order line {} has fewer refunded units than refund {refund_id}",
                                item.order_line_id
                            ))));
                        }
                    }
                    if current.organization_amount > 0 {
                        apply_in(
                            &mut tx,
                            current.organization_id,
                            BalanceOp::CreditFunds,
                            from_cents(current.organization_amount),
                            ReferenceKind::Refund,
                            refund_id,
                            Some(to.as_str()),
                        )
                        .await?;
                    }
                }

                let mut order_refunded = false;
                if to == RefundStatus::Completed {
                    if restock {
                        for item in &items {
                            let line = order::find_line(&mut tx, item.order_line_id).await?.ok_or(
                                OrderError::LineNotFound {
                                    order_id: current.order_id,
                                    line_id: item.order_line_id,
                                },
                            )?;
                            restock_in(&mut tx, line.variant_id, line.location_id, item.quantity, Some(current.order_id))
                                .await?;
                        }
                    }
                    if refund::lines_not_fully_refunded(&mut tx, current.order_id).await? == 0 {
                        order_refunded = order::update_status_if(
                            &mut tx,
                            current.order_id,
                            OrderStatus::Delivered,
                            OrderStatus::Refunded,
                            now_millis(),
                        )
                        .await?;
                        if order_refunded {
                            order::insert_history(
                                &mut tx,
                                current.order_id,
                                Some(OrderStatus::Delivered),
                                OrderStatus::Refunded,
                                Some(ALL_LINES_REFUNDED),
                                now_millis(),
                            )
                            .await?;
                        }
                    }
                }

                let detail = load_refund(&mut tx, refund_id).await?;
                tx.commit().await?;
                Ok((detail, from, order_refunded))
            })
            .await?;

        let order_id = detail.refund.order_id;
        tracing::info!(
            refund_id,
            order_id,
            organization_id = detail.refund.organization_id,
            from = %from,
            to = %to,
            restock,
            "Refund status changed"
        );
        self.notify(OrderNotification::RefundResolved {
            order_id,
            refund_id,
            status: to,
        });
        if order_refunded {
            tracing::info!(order_id, "Order fully refunded");
            self.notify(OrderNotification::StatusChanged {
                order_id,
                from: OrderStatus::Delivered,
                to: OrderStatus::Refunded,
            });
        }
        Ok(detail)
    }

    pub async fn get_refund(&self, refund_id: i64) -> OrderResult<RefundDetail> {
        let mut conn = self.pool.acquire().await?;
        load_refund(&mut conn, refund_id).await
    }

    /// Every refund of the order, oldest first
    pub async fn list_refunds(&self, order_id: i64) -> OrderResult<Vec<RefundDetail>> {
        let mut conn = self.pool.acquire().await?;
        order::find_order(&mut conn, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        let rows = refund::refunds_for_order(&mut conn, order_id).await?;
        let mut refunds = Vec::with_capacity(rows.len());
        for row in rows {
            let items = refund::items_for_refund(&mut conn, row.id)
                .await?
                .into_iter()
                .map(RefundItemRow::into_model)
                .collect();
            refunds.push(RefundDetail {
                refund: row.into_model(),
                items,
            });
        }
        Ok(refunds)
    }
}
