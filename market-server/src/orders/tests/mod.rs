//! Order flow tests against a real SQLite store

mod lifecycle;

use super::{Collaborators, OrderService};
use crate::balance::BalanceLedger;
use crate::collaborators::OrderEventBus;
use crate::db::RetryPolicy;
use crate::db::fixtures::{self, TestDb};
use crate::inventory::InventoryLedger;
use rust_decimal::Decimal;
use shared::models::{
    CreateOrderRequest, OrderDetail, OrderItemRequest, OrderNotification, OrderStatus, UpdateOrderStatusRequest,
};
use tokio::sync::broadcast;

pub(super) struct Harness {
    pub t: TestDb,
    pub orders: OrderService,
    pub inventory: InventoryLedger,
    pub balance: BalanceLedger,
    pub events: broadcast::Receiver<OrderNotification>,
}

pub(super) fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Two vendors:
/// - vendor 1 sells variant 11 at $100, 10 in stock, 15% vendor rule
/// - vendor 2 sells variant 21 at $50, 10 in stock, no rule of its own
///
/// Vendors default to a 10% organization-type rule.
pub(super) async fn harness() -> Harness {
    let t = fixtures::test_db().await;
    let pool = t.pool();
    fixtures::vendor_variant(pool, 1, 11, 10_000, 10).await;
    fixtures::vendor_variant(pool, 2, 21, 5_000, 10).await;
    fixtures::commission_rule(pool, 1, "vendor", Some(1), None, "percentage", 1500).await;
    fixtures::commission_rule(pool, 2, "organization_type", None, Some("vendor"), "percentage", 1000).await;
    build(t, |c| c).await
}

/// Harness with some collaborators replaced
pub(super) async fn build(t: TestDb, customize: impl FnOnce(Collaborators) -> Collaborators) -> Harness {
    let retry = RetryPolicy::default();
    let bus = OrderEventBus::new(64);
    let events = bus.subscribe();
    let inventory = InventoryLedger::new(t.pool().clone(), retry);
    let balance = BalanceLedger::new(t.pool().clone(), retry);
    let collaborators = customize(Collaborators::sql(t.pool(), bus));
    let orders = OrderService::new(t.pool().clone(), retry, inventory.clone(), balance.clone(), collaborators);
    Harness {
        t,
        orders,
        inventory,
        balance,
        events,
    }
}

impl Harness {
    pub async fn order(&self, items: Vec<OrderItemRequest>) -> OrderDetail {
        self.orders
            .create_order(CreateOrderRequest {
                customer_id: 500,
                shipping_method_id: None,
                items,
            })
            .await
            .unwrap()
    }

    pub async fn advance(&self, order_id: i64, status: OrderStatus) -> OrderDetail {
        self.orders
            .update_status(order_id, UpdateOrderStatusRequest { status, reason: None })
            .await
            .unwrap()
    }

    /// Created and walked to `delivered`
    pub async fn delivered(&self, items: Vec<OrderItemRequest>) -> OrderDetail {
        let order = self.order(items).await;
        self.advance(order.order.id, OrderStatus::Processing).await;
        self.advance(order.order.id, OrderStatus::Shipped).await;
        self.advance(order.order.id, OrderStatus::Delivered).await
    }

    /// Every organization's cached balance equals the fold of its log
    pub async fn assert_ledgers_consistent(&self) {
        for organization_id in [1, 2] {
            let rec = self.balance.reconcile(organization_id).await.unwrap();
            assert!(rec.consistent, "{rec:?}");
        }
    }

    pub async fn order_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.t.pool())
            .await
            .unwrap()
    }

    pub fn drain_events(&mut self) -> Vec<OrderNotification> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
