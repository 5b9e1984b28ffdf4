//! Vendor Balance Ledger
//!
//! Per-organization running balances backed by an append-only
//! transaction log. The log is the system of record; `vendor_balance`
//! is its cached fold.

pub mod error;
pub mod fold;
pub mod ledger;

pub use error::{BalanceError, BalanceResult};
pub use ledger::{BalanceLedger, BalanceOp, apply_in};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RetryPolicy;
    use crate::db::fixtures::{self, TestDb};
    use rust_decimal::Decimal;
    use shared::models::{BalanceField, TransactionType};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn setup() -> (TestDb, BalanceLedger) {
        let t = fixtures::test_db().await;
        fixtures::organization(t.pool(), 1, "vendor").await;
        let ledger = BalanceLedger::new(t.pool().clone(), RetryPolicy::default());
        (t, ledger)
    }

    async fn assert_consistent(ledger: &BalanceLedger, organization_id: i64) {
        let rec = ledger.reconcile(organization_id).await.unwrap();
        assert!(rec.consistent, "{rec:?}");
    }

    #[tokio::test]
    async fn test_unknown_organization_has_zero_balance() {
        let (_t, ledger) = setup().await;
        let balance = ledger.balance(42).await.unwrap();
        assert_eq!(balance.available_balance, Decimal::ZERO);
        assert!(ledger.transactions(42).await.unwrap().is_empty());
        assert_consistent(&ledger, 42).await;
    }

    #[tokio::test]
    async fn test_writes_for_unknown_organization_fail() {
        let (t, ledger) = setup().await;
        let err = ledger.credit_funds(999, dec("1.00"), 1).await.unwrap_err();
        assert!(matches!(err, BalanceError::OrganizationNotFound(999)));
        let err = ledger.hold(999, dec("1.00"), 1).await.unwrap_err();
        assert!(matches!(err, BalanceError::OrganizationNotFound(999)));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendor_balance WHERE organization_id = 999")
            .fetch_one(t.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
        assert!(ledger.transactions(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hold_then_release() {
        let (_t, ledger) = setup().await;
        ledger.hold(1, dec("85.00"), 100).await.unwrap();
        let held = ledger.balance(1).await.unwrap();
        assert_eq!(held.pending_balance, dec("85.00"));
        assert_eq!(held.total_earnings, dec("85.00"));

        let txn = ledger.release(1, dec("85.00"), 100).await.unwrap();
        assert_eq!(txn.transaction_type, TransactionType::Release);
        assert_eq!(txn.balance_field, BalanceField::Pending);
        assert_eq!(txn.balance_before, dec("85.00"));
        assert_eq!(txn.balance_after, Decimal::ZERO);

        let released = ledger.balance(1).await.unwrap();
        assert_eq!(released.pending_balance, Decimal::ZERO);
        assert_eq!(released.available_balance, dec("85.00"));
        assert_eq!(released.total_earnings, held.total_earnings);
        assert_consistent(&ledger, 1).await;
    }

    #[tokio::test]
    async fn test_hold_then_refund_funds_restores() {
        let (_t, ledger) = setup().await;
        ledger.hold(1, dec("10.00"), 99).await.unwrap();
        let before = ledger.balance(1).await.unwrap();

        ledger.hold(1, dec("45.00"), 100).await.unwrap();
        ledger.refund_funds(1, dec("45.00"), 100).await.unwrap();

        let after = ledger.balance(1).await.unwrap();
        assert!(after.same_totals(&before));
        assert_consistent(&ledger, 1).await;
    }

    #[tokio::test]
    async fn test_debit_then_credit_restores() {
        let (_t, ledger) = setup().await;
        ledger.credit_funds(1, dec("200.00"), 1).await.unwrap();
        let before = ledger.balance(1).await.unwrap();

        ledger.debit_for_refund(1, dec("90.00"), 2).await.unwrap();
        let debited = ledger.balance(1).await.unwrap();
        assert_eq!(debited.available_balance, dec("110.00"));

        ledger.credit_funds(1, dec("90.00"), 2).await.unwrap();
        let after = ledger.balance(1).await.unwrap();
        assert_eq!(after.available_balance, before.available_balance);
        assert_eq!(after.total_earnings, before.total_earnings);
        assert_consistent(&ledger, 1).await;
    }

    #[tokio::test]
    async fn test_insufficient_balance_writes_nothing() {
        let (_t, ledger) = setup().await;
        ledger.hold(1, dec("50.00"), 100).await.unwrap();
        let before = ledger.balance(1).await.unwrap();

        let err = ledger.release(1, dec("50.01"), 100).await.unwrap_err();
        match err {
            BalanceError::InsufficientBalance { field, available, .. } => {
                assert_eq!(field, BalanceField::Pending);
                assert_eq!(available, dec("50.00"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = ledger.debit_for_refund(1, dec("1.00"), 5).await.unwrap_err();
        assert!(matches!(
            err,
            BalanceError::InsufficientBalance {
                field: BalanceField::Available,
                ..
            }
        ));

        let after = ledger.balance(1).await.unwrap();
        assert!(after.same_totals(&before));
        assert_eq!(ledger.transactions(1).await.unwrap().len(), 1);
        assert_consistent(&ledger, 1).await;
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let (_t, ledger) = setup().await;
        let err = ledger.hold(1, Decimal::ZERO, 100).await.unwrap_err();
        assert!(matches!(err, BalanceError::InvalidAmount(_)));
        let err = ledger.credit_funds(1, dec("-5"), 100).await.unwrap_err();
        assert!(matches!(err, BalanceError::InvalidAmount(_)));
        let err = ledger.hold(1, dec("0.001"), 100).await.unwrap_err();
        assert!(matches!(err, BalanceError::InvalidAmount(_)));
        assert!(ledger.transactions(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payout_cycle_and_fold() {
        let (_t, ledger) = setup().await;
        ledger.hold(1, dec("100.00"), 100).await.unwrap();
        ledger.release(1, dec("100.00"), 100).await.unwrap();
        ledger.payout_request(1, dec("60.00"), 500).await.unwrap();

        let mid = ledger.balance(1).await.unwrap();
        assert_eq!(mid.available_balance, dec("40.00"));
        assert_eq!(mid.pending_balance, dec("60.00"));

        ledger.payout_processed(1, dec("60.00"), 500).await.unwrap();
        let done = ledger.balance(1).await.unwrap();
        assert_eq!(done.pending_balance, Decimal::ZERO);
        assert_eq!(done.total_paid_out, dec("60.00"));
        assert_eq!(done.total_earnings, dec("100.00"));

        let rec = ledger.reconcile(1).await.unwrap();
        assert!(rec.consistent);
        assert_eq!(rec.transaction_count, 4);
    }
}
