//! Vendor Payouts
//!
//! A payout moves funds out of `available` into `pending` when it is
//! requested and out of `pending` into `total_paid_out` once the payment
//! rail confirms it. Each step writes the payout row and the ledger
//! transaction in one transaction.

pub mod error;

pub use error::{PayoutError, PayoutResult};

use crate::balance::{BalanceOp, apply_in};
use crate::db::RetryPolicy;
use crate::db::repository::payout::{self, PayoutRow};
use crate::utils::money::{from_cents, positive_cents};
use rust_decimal::Decimal;
use shared::models::{PayoutStatus, ReferenceKind, VendorPayout};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct PayoutService {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl PayoutService {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Create a pending payout and move `amount` from available to pending
    pub async fn request(
        &self,
        organization_id: i64,
        amount: Decimal,
        destination: &str,
    ) -> PayoutResult<VendorPayout> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(PayoutError::Validation("destination is required".into()));
        }
        let cents = positive_cents(amount)?;

        let pool = &self.pool;
        let payout = self
            .retry
            .run("payout.request", move || async move {
                let mut tx = pool.begin().await?;
                let row = PayoutRow {
                    id: snowflake_id(),
                    organization_id,
                    amount: cents,
                    status: PayoutStatus::Pending,
                    destination: destination.to_string(),
                    external_reference: None,
                    created_at: now_millis(),
                    processed_at: None,
                };
                apply_in(
                    &mut tx,
                    organization_id,
                    BalanceOp::PayoutRequest,
                    amount,
                    ReferenceKind::Payout,
                    row.id,
                    Some(destination),
                )
                .await?;
                payout::insert(&mut tx, &row).await?;
                tx.commit().await?;
                Ok::<_, PayoutError>(row.into_model())
            })
            .await?;

        tracing::info!(
            payout_id = payout.id,
            organization_id,
            amount = %amount,
            "Payout requested"
        );
        Ok(payout)
    }

    /// `pending → processed`; a second call is a conflict
    pub async fn process(&self, payout_id: i64, external_reference: Option<&str>) -> PayoutResult<VendorPayout> {
        let pool = &self.pool;
        let payout = self
            .retry
            .run("payout.process", move || async move {
                let mut tx = pool.begin().await?;
                let row = payout::find(&mut tx, payout_id)
                    .await?
                    .ok_or(PayoutError::NotFound(payout_id))?;
                if row.status == PayoutStatus::Processed {
                    return Err(PayoutError::AlreadyProcessed(payout_id));
                }
                let now = now_millis();
                if !payout::mark_processed(&mut tx, payout_id, external_reference, now).await? {
                    return Err(PayoutError::AlreadyProcessed(payout_id));
                }
                let organization_id = row.organization_id;
                let amount = from_cents(row.amount);
                apply_in(
                    &mut tx,
                    organization_id,
                    BalanceOp::PayoutProcessed,
                    amount,
                    ReferenceKind::Payout,
                    payout_id,
                    external_reference,
                )
                .await?;
                let updated = payout::find(&mut tx, payout_id)
                    .await?
                    .ok_or(PayoutError::NotFound(payout_id))?;
                tx.commit().await?;
                Ok(updated.into_model())
            })
            .await?;

        tracing::info!(
            payout_id,
            organization_id = payout.organization_id,
            amount = %payout.amount,
            "Payout processed"
        );
        Ok(payout)
    }

    pub async fn get(&self, payout_id: i64) -> PayoutResult<VendorPayout> {
        let mut conn = self.pool.acquire().await?;
        payout::find(&mut conn, payout_id)
            .await?
            .map(PayoutRow::into_model)
            .ok_or(PayoutError::NotFound(payout_id))
    }

    /// Newest first
    pub async fn list(&self, organization_id: i64) -> PayoutResult<Vec<VendorPayout>> {
        let mut conn = self.pool.acquire().await?;
        Ok(payout::list_for_organization(&mut conn, organization_id)
            .await?
            .into_iter()
            .map(PayoutRow::into_model)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{BalanceError, BalanceLedger};
    use crate::db::fixtures::{self, TestDb};
    use shared::error::{AppError, ErrorCode};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// Organization 1 with $100 available
    async fn setup() -> (TestDb, PayoutService, BalanceLedger) {
        let t = fixtures::test_db().await;
        fixtures::organization(t.pool(), 1, "vendor").await;
        let ledger = BalanceLedger::new(t.pool().clone(), RetryPolicy::default());
        ledger.hold(1, dec("100.00"), 10).await.unwrap();
        ledger.release(1, dec("100.00"), 10).await.unwrap();
        let payouts = PayoutService::new(t.pool().clone(), RetryPolicy::default());
        (t, payouts, ledger)
    }

    #[tokio::test]
    async fn test_request_and_process() {
        let (_t, payouts, ledger) = setup().await;

        let payout = payouts.request(1, dec("60.00"), "IBAN DE00 1234").await.unwrap();
        assert_eq!(payout.status, PayoutStatus::Pending);
        let balance = ledger.balance(1).await.unwrap();
        assert_eq!(balance.available_balance, dec("40.00"));
        assert_eq!(balance.pending_balance, dec("60.00"));

        let processed = payouts.process(payout.id, Some("rail-42")).await.unwrap();
        assert_eq!(processed.status, PayoutStatus::Processed);
        assert_eq!(processed.external_reference.as_deref(), Some("rail-42"));
        assert!(processed.processed_at.is_some());

        let balance = ledger.balance(1).await.unwrap();
        assert_eq!(balance.pending_balance, Decimal::ZERO);
        assert_eq!(balance.total_paid_out, dec("60.00"));
        assert!(ledger.reconcile(1).await.unwrap().consistent);
    }

    #[tokio::test]
    async fn test_process_twice_is_conflict() {
        let (_t, payouts, ledger) = setup().await;
        let payout = payouts.request(1, dec("10.00"), "acct").await.unwrap();
        payouts.process(payout.id, None).await.unwrap();

        let err = payouts.process(payout.id, None).await.unwrap_err();
        assert!(matches!(err, PayoutError::AlreadyProcessed(id) if id == payout.id));
        assert_eq!(ledger.balance(1).await.unwrap().total_paid_out, dec("10.00"));
    }

    #[tokio::test]
    async fn test_request_over_available_rolls_back() {
        let (_t, payouts, ledger) = setup().await;
        let err = payouts.request(1, dec("100.01"), "acct").await.unwrap_err();
        assert!(matches!(
            err,
            PayoutError::Balance(BalanceError::InsufficientBalance { .. })
        ));
        assert!(payouts.list(1).await.unwrap().is_empty());
        assert_eq!(ledger.balance(1).await.unwrap().available_balance, dec("100.00"));
    }

    #[tokio::test]
    async fn test_request_for_unknown_organization() {
        let (_t, payouts, ledger) = setup().await;
        let err = payouts.request(999, dec("1.00"), "acct").await.unwrap_err();
        assert!(matches!(
            err,
            PayoutError::Balance(BalanceError::OrganizationNotFound(999))
        ));
        assert!(payouts.list(999).await.unwrap().is_empty());
        assert!(ledger.transactions(999).await.unwrap().is_empty());

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::OrganizationNotFound);
        assert_eq!(app.http_status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_validation() {
        let (_t, payouts, _ledger) = setup().await;
        assert!(matches!(
            payouts.request(1, dec("5.00"), "  ").await.unwrap_err(),
            PayoutError::Validation(_)
        ));
        assert!(matches!(
            payouts.request(1, Decimal::ZERO, "acct").await.unwrap_err(),
            PayoutError::Balance(BalanceError::InvalidAmount(_))
        ));
        assert!(matches!(payouts.get(404).await.unwrap_err(), PayoutError::NotFound(404)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_t, payouts, _ledger) = setup().await;
        let first = payouts.request(1, dec("1.00"), "a").await.unwrap();
        let second = payouts.request(1, dec("2.00"), "b").await.unwrap();
        let ids: Vec<i64> = payouts.list(1).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
