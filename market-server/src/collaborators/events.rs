//! In-process notification bus

use super::Notifier;
use shared::models::OrderNotification;
use tokio::sync::broadcast;

/// Broadcasts order notifications to whoever subscribed; with no
/// subscribers they are dropped.
#[derive(Debug, Clone)]
pub struct OrderEventBus {
    tx: broadcast::Sender<OrderNotification>,
}

impl OrderEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderNotification> {
        self.tx.subscribe()
    }
}

impl Notifier for OrderEventBus {
    fn notify(&self, notification: OrderNotification) {
        let order_id = notification.order_id();
        if self.tx.send(notification).is_err() {
            tracing::trace!(order_id, "No notification subscribers");
        }
    }
}
