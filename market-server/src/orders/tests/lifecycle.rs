use super::*;
use crate::orders::OrderError;
use shared::models::MovementReason;

#[tokio::test]
async fn test_cancel_pending_order_unwinds() {
    let mut h = harness().await;
    let detail = h.order(vec![OrderItemRequest::variant(21, 2)]).await;
    let order_id = detail.order.id;
    assert_eq!(h.inventory.get(21, 21).await.unwrap().reserved, 2);
    h.drain_events();

    let cancelled = h.orders.cancel(order_id, "customer changed mind").await.unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    let last = cancelled.history.last().unwrap();
    assert_eq!(last.from_status, Some(OrderStatus::Pending));
    assert_eq!(last.to_status, OrderStatus::Cancelled);
    assert_eq!(last.reason.as_deref(), Some("customer changed mind"));

    let record = h.inventory.get(21, 21).await.unwrap();
    assert_eq!(record.reserved, 0);
    assert_eq!(record.quantity, 10);
    let b2 = h.balance.balance(2).await.unwrap();
    assert_eq!(b2.pending_balance, Decimal::ZERO);
    assert_eq!(b2.total_earnings, Decimal::ZERO);

    assert_eq!(
        h.drain_events(),
        vec![OrderNotification::Cancelled {
            order_id,
            reason: "customer changed mind".into()
        }]
    );
    h.assert_ledgers_consistent().await;

    // terminal
    let err = h.orders.cancel(order_id, "again").await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidStateFor { .. }));
}

#[tokio::test]
async fn test_cancel_via_status_update_from_processing() {
    let h = harness().await;
    let detail = h.order(vec![OrderItemRequest::variant(11, 1)]).await;
    h.advance(detail.order.id, OrderStatus::Processing).await;

    let cancelled = h
        .orders
        .update_status(
            detail.order.id,
            UpdateOrderStatusRequest {
                status: OrderStatus::Cancelled,
                reason: Some("out of policy".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(h.inventory.get(11, 11).await.unwrap().reserved, 0);
    assert_eq!(h.balance.balance(1).await.unwrap().pending_balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_full_lifecycle_moves_stock_and_money() {
    let h = harness().await;
    let detail = h
        .order(vec![OrderItemRequest::variant(11, 2), OrderItemRequest::variant(21, 1)])
        .await;
    let order_id = detail.order.id;

    h.advance(order_id, OrderStatus::Processing).await;
    let shipped = h.advance(order_id, OrderStatus::Shipped).await;
    assert_eq!(shipped.order.status, OrderStatus::Shipped);

    let record = h.inventory.get(11, 11).await.unwrap();
    assert_eq!(record.quantity, 8);
    assert_eq!(record.reserved, 0);
    assert_eq!(h.inventory.reservation_for(order_id, 11).await.unwrap(), None);
    let reasons: Vec<_> = h
        .inventory
        .movements(11, 11)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.reason)
        .collect();
    assert_eq!(reasons, vec![MovementReason::Reserve, MovementReason::Fulfill]);

    // money stays pending until delivery
    assert_eq!(h.balance.balance(1).await.unwrap().pending_balance, dec("170.00"));

    let delivered = h.advance(order_id, OrderStatus::Delivered).await;
    assert_eq!(delivered.history.len(), 4);

    let b1 = h.balance.balance(1).await.unwrap();
    assert_eq!(b1.pending_balance, Decimal::ZERO);
    assert_eq!(b1.available_balance, dec("170.00"));
    assert_eq!(b1.total_earnings, dec("170.00"));
    let b2 = h.balance.balance(2).await.unwrap();
    assert_eq!(b2.available_balance, dec("45.00"));
    h.assert_ledgers_consistent().await;
}

#[tokio::test]
async fn test_invalid_transitions() {
    let h = harness().await;
    let detail = h.order(vec![OrderItemRequest::variant(11, 1)]).await;
    let order_id = detail.order.id;

    for status in [OrderStatus::Pending, OrderStatus::Shipped, OrderStatus::Delivered, OrderStatus::Refunded] {
        let err = h
            .orders
            .update_status(order_id, UpdateOrderStatusRequest { status, reason: None })
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidState { .. }), "{status}: {err:?}");
    }

    h.advance(order_id, OrderStatus::Processing).await;
    h.advance(order_id, OrderStatus::Shipped).await;
    let err = h.orders.cancel(order_id, "too late").await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidStateFor {
            status: OrderStatus::Shipped,
            ..
        }
    ));

    let err = h.orders.get_order(404).await.unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(404)));
}

#[tokio::test]
async fn test_ship_without_reservation_fails_whole_update() {
    let h = harness().await;
    let detail = h
        .order(vec![OrderItemRequest::variant(11, 1), OrderItemRequest::variant(21, 1)])
        .await;
    let order_id = detail.order.id;
    h.advance(order_id, OrderStatus::Processing).await;

    // reservation for variant 21 lost out of band
    h.inventory.release(21, 21, 1, Some(order_id)).await.unwrap();

    let err = h
        .orders
        .update_status(
            order_id,
            UpdateOrderStatusRequest {
                status: OrderStatus::Shipped,
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::ReservationNotFound {
            variant_id: 21,
            missing: 1,
            ..
        }
    ));

    // nothing shipped, not even variant 11
    let record = h.inventory.get(11, 11).await.unwrap();
    assert_eq!(record.quantity, 10);
    assert_eq!(record.reserved, 1);
    assert_eq!(
        h.orders.get_order(order_id).await.unwrap().order.status,
        OrderStatus::Processing
    );
}

#[tokio::test]
async fn test_delivery_release_failure_does_not_block() {
    let h = harness().await;
    let detail = h
        .order(vec![OrderItemRequest::variant(11, 1), OrderItemRequest::variant(21, 1)])
        .await;
    let order_id = detail.order.id;
    h.advance(order_id, OrderStatus::Processing).await;
    h.advance(order_id, OrderStatus::Shipped).await;

    // vendor 2's hold disappears before delivery
    h.balance.refund_funds(2, dec("45.00"), order_id).await.unwrap();

    let delivered = h.advance(order_id, OrderStatus::Delivered).await;
    assert_eq!(delivered.order.status, OrderStatus::Delivered);
    assert_eq!(h.balance.balance(1).await.unwrap().available_balance, dec("85.00"));
    assert_eq!(h.balance.balance(2).await.unwrap().available_balance, Decimal::ZERO);
    h.assert_ledgers_consistent().await;
}
