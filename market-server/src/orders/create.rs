//! Order creation

use super::{OrderError, OrderResult, OrderService, transition_in, vendor_shares};
use crate::balance::{BalanceOp, apply_in};
use crate::commission::{RuleIndex, resolve};
use crate::db::repository::catalog::{self, CommissionRuleRow};
use crate::db::repository::order::{self, OrderLineRow, OrderRow};
use crate::utils::money::{MAX_QUANTITY, line_total, round_money, to_cents};
use rust_decimal::Decimal;
use shared::models::{
    CreateOrderRequest, OrderDetail, OrderItemRequest, OrderLine, OrderNotification, OrderStatus, ReferenceKind,
    VariantSnapshot,
};
use shared::util::{now_millis, order_number, snowflake_id};
use std::collections::{BTreeMap, HashMap};

/// One line to be created, after bundle expansion and merging
#[derive(Debug, Clone, PartialEq)]
struct PlannedLine {
    variant_id: i64,
    bundle_id: Option<i64>,
    quantity: i64,
    /// Bundle price of the component; catalog price otherwise
    unit_price: Option<Decimal>,
}

fn validate_items(items: &[OrderItemRequest]) -> OrderResult<()> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }
    for item in items {
        if item.quantity < 1 || item.quantity > MAX_QUANTITY {
            return Err(OrderError::Validation(format!(
                "quantity must be between 1 and {MAX_QUANTITY}, got {}",
                item.quantity
            )));
        }
        if item.variant_id.is_some() == item.bundle_id.is_some() {
            return Err(OrderError::Validation(
                "each item needs exactly one of variant_id or bundle_id".into(),
            ));
        }
    }
    Ok(())
}

/// Merge lines with the same (variant, bundle); quantities add up
fn merge_lines(planned: Vec<PlannedLine>) -> OrderResult<Vec<PlannedLine>> {
    let mut merged: Vec<PlannedLine> = Vec::with_capacity(planned.len());
    for line in planned {
        match merged
            .iter_mut()
            .find(|m| m.variant_id == line.variant_id && m.bundle_id == line.bundle_id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line),
        }
    }
    if let Some(line) = merged.iter().find(|l| l.quantity > MAX_QUANTITY) {
        return Err(OrderError::Validation(format!(
            "variant {} exceeds {MAX_QUANTITY} units after merging duplicate items",
            line.variant_id
        )));
    }
    Ok(merged)
}

impl OrderService {
    /// Create an order.
    ///
    /// Nothing is persisted unless every line has a fulfillment location.
    /// Stock is reserved after the order commits; if that fails the order
    /// is unwound, marked `cancelled`, and the reservation error returned.
    pub async fn create_order(&self, req: CreateOrderRequest) -> OrderResult<OrderDetail> {
        validate_items(&req.items)?;

        let shipping_method = match req.shipping_method_id {
            Some(id) => Some(self.shipping.validate_method(id).await?),
            None => None,
        };

        // Expand bundles into component lines
        let mut planned = Vec::new();
        let mut bundle_quantities: BTreeMap<i64, i64> = BTreeMap::new();
        for item in &req.items {
            match (item.variant_id, item.bundle_id) {
                (Some(variant_id), None) => planned.push(PlannedLine {
                    variant_id,
                    bundle_id: None,
                    quantity: item.quantity,
                    unit_price: None,
                }),
                (None, Some(bundle_id)) => {
                    let components = self.bundles.components(bundle_id).await?;
                    if components.is_empty() {
                        return Err(OrderError::Validation(format!("bundle {bundle_id} has no components")));
                    }
                    for component in components {
                        planned.push(PlannedLine {
                            variant_id: component.variant_id,
                            bundle_id: Some(bundle_id),
                            quantity: component.quantity * item.quantity,
                            unit_price: Some(component.unit_price),
                        });
                    }
                    *bundle_quantities.entry(bundle_id).or_insert(0) += item.quantity;
                }
                _ => {
                    return Err(OrderError::Validation(
                        "each item needs exactly one of variant_id or bundle_id".into(),
                    ));
                }
            }
        }
        let planned = merge_lines(planned)?;

        // Variant snapshots
        let mut ids: Vec<i64> = planned.iter().map(|l| l.variant_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let variants: HashMap<i64, VariantSnapshot> = self
            .catalog
            .load_variants(&ids)
            .await?
            .into_iter()
            .map(|v| (v.variant_id, v))
            .collect();
        let mut currency: Option<&str> = None;
        for id in &ids {
            let variant = variants.get(id).ok_or(OrderError::VariantNotFound(*id))?;
            if !variant.is_active {
                return Err(OrderError::VariantInactive(*id));
            }
            match currency {
                None => currency = Some(variant.currency.as_str()),
                Some(c) if c != variant.currency => {
                    return Err(OrderError::CurrencyMismatch(c.to_string(), variant.currency.clone()));
                }
                Some(_) => {}
            }
        }
        let currency = currency.unwrap_or_default().to_string();

        // One fulfillment location per variant covering its combined demand
        // across direct and bundle lines; abort before persisting anything
        let mut demand: BTreeMap<i64, i64> = BTreeMap::new();
        for line in &planned {
            *demand.entry(line.variant_id).or_insert(0) += line.quantity;
        }
        let mut chosen: HashMap<i64, i64> = HashMap::with_capacity(demand.len());
        for (&variant_id, &quantity) in &demand {
            let location_id = self
                .inventory
                .find_best_location(variant_id, quantity)
                .await?
                .ok_or(OrderError::NoFulfillmentLocation { variant_id, quantity })?;
            chosen.insert(variant_id, location_id);
        }
        let locations: Vec<i64> = planned
            .iter()
            .filter_map(|line| chosen.get(&line.variant_id).copied())
            .collect();

        // Commission snapshot per line from one rule load
        let rules = {
            let mut conn = self.pool.acquire().await?;
            catalog::load_commission_rules(&mut conn).await?
        };
        let index = RuleIndex::new(rules.into_iter().map(CommissionRuleRow::into_model));

        let order_id = snowflake_id();
        let now = now_millis();
        let mut line_rows = Vec::with_capacity(planned.len());
        let mut subtotal = Decimal::ZERO;
        let mut platform_fee_total = Decimal::ZERO;
        let mut total_weight = Decimal::ZERO;
        for (line, &location_id) in planned.iter().zip(&locations) {
            let variant = &variants[&line.variant_id];
            let unit_price = line.unit_price.unwrap_or(variant.price);
            let amount = line_total(unit_price, line.quantity);
            let split = resolve(amount, &index.hierarchy_for(variant));

            subtotal += amount;
            platform_fee_total += split.platform_fee_amount;
            total_weight += variant.weight * Decimal::from(line.quantity);

            line_rows.push(OrderLineRow {
                id: snowflake_id(),
                order_id,
                variant_id: line.variant_id,
                product_id: variant.product_id,
                organization_id: variant.organization_id,
                location_id,
                bundle_id: line.bundle_id,
                sku: variant.sku.clone(),
                quantity: line.quantity,
                refunded_quantity: 0,
                unit_price: to_cents(unit_price)?,
                line_total: to_cents(amount)?,
                fee_type: split.fee_type,
                fee_rate: to_cents(split.fee_rate)?,
                platform_fee_amount: to_cents(split.platform_fee_amount)?,
                organization_amount: to_cents(split.organization_amount)?,
                commission_source: split.source,
            });
        }

        let shipping_amount = match &shipping_method {
            Some(method) => self.shipping.calculate_rate(method, total_weight, subtotal),
            None => Decimal::ZERO,
        };
        let total = round_money(subtotal + shipping_amount);

        let order_row = OrderRow {
            id: order_id,
            order_number: order_number(now),
            customer_id: req.customer_id,
            status: OrderStatus::Pending,
            currency,
            subtotal: to_cents(subtotal)?,
            shipping_amount: to_cents(shipping_amount)?,
            total: to_cents(total)?,
            platform_fee_total: to_cents(platform_fee_total)?,
            shipping_method_id: shipping_method.as_ref().map(|m| m.id),
            created_at: now,
            updated_at: now,
        };
        let lines: Vec<_> = line_rows.iter().cloned().map(OrderLineRow::into_model).collect();
        let holds = vendor_shares(&lines);

        // Order, lines, bundles, history and holds in one unit
        let pool = &self.pool;
        let (order_ref, lines_ref, bundles_ref, holds_ref) = (&order_row, &line_rows, &bundle_quantities, &holds);
        self.retry
            .run("order.create", move || async move {
                let mut tx = pool.begin().await?;
                order::insert_order(&mut tx, order_ref).await?;
                for line in lines_ref {
                    order::insert_line(&mut tx, line).await?;
                }
                for (&bundle_id, &qty) in bundles_ref {
                    order::insert_bundle(&mut tx, order_id, bundle_id, qty).await?;
                }
                order::insert_history(&mut tx, order_id, None, OrderStatus::Pending, None, order_ref.created_at)
                    .await?;
                for (&organization_id, &amount) in holds_ref {
                    if amount > Decimal::ZERO {
                        apply_in(
                            &mut tx,
                            organization_id,
                            BalanceOp::Hold,
                            amount,
                            ReferenceKind::Order,
                            order_id,
                            Some(order_ref.order_number.as_str()),
                        )
                        .await?;
                    }
                }
                tx.commit().await?;
                Ok::<_, OrderError>(())
            })
            .await?;

        tracing::info!(
            order_id,
            order_number = %order_row.order_number,
            lines = lines.len(),
            total = %total,
            "Order created"
        );

        // Reserve outside the order transaction
        if let Err(e) = self.reserve_all(order_id, &lines, &bundle_quantities).await {
            self.compensate_failed_reservation(order_id, &lines, &holds, &e).await;
            return Err(e);
        }

        self.notify(OrderNotification::Created {
            order_id,
            order_number: order_row.order_number.clone(),
            customer_id: order_row.customer_id,
        });
        self.get_order(order_id).await
    }

    /// Reserve each line at its location, then each bundle. On failure
    /// the bundles reserved so far are released here; stock reservations
    /// are found from movements by the unwind.
    async fn reserve_all(
        &self,
        order_id: i64,
        lines: &[OrderLine],
        bundle_quantities: &BTreeMap<i64, i64>,
    ) -> OrderResult<()> {
        for line in lines {
            self.inventory
                .reserve(line.variant_id, line.location_id, line.quantity, order_id)
                .await?;
        }
        let mut reserved: Vec<(i64, i64)> = Vec::new();
        for (&bundle_id, &qty) in bundle_quantities {
            if let Err(e) = self.bundles.reserve(bundle_id, qty, order_id).await {
                self.unwind_effects(order_id, &[], &reserved, &BTreeMap::new()).await;
                return Err(e.into());
            }
            reserved.push((bundle_id, qty));
        }
        Ok(())
    }

    async fn compensate_failed_reservation(
        &self,
        order_id: i64,
        lines: &[OrderLine],
        holds: &BTreeMap<i64, Decimal>,
        cause: &OrderError,
    ) {
        tracing::warn!(order_id, error = %cause, "Reservation failed after order commit, unwinding");
        self.unwind_effects(order_id, lines, &[], holds).await;

        let reason = format!("reservation failed: {cause}");
        let pool = &self.pool;
        let reason_ref = reason.as_str();
        let marked = self
            .retry
            .run("order.cancel_unreserved", move || async move {
                let mut tx = pool.begin().await?;
                transition_in(&mut tx, order_id, OrderStatus::Pending, OrderStatus::Cancelled, Some(reason_ref))
                    .await?;
                tx.commit().await?;
                Ok::<_, OrderError>(())
            })
            .await;
        match marked {
            Ok(()) => self.notify(OrderNotification::Cancelled { order_id, reason }),
            Err(e) => tracing::error!(order_id, error = %e, "Failed to mark unreserved order cancelled"),
        }
    }
}
