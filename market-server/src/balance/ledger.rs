//! Vendor Balance Ledger
//!
//! Every operation is one conditional UPDATE of the four balance fields
//! plus one transaction row, in the same transaction. If the guard field
//! would go negative nothing is written.

use super::error::{BalanceError, BalanceResult};
use super::fold;
use crate::db::RetryPolicy;
use crate::db::repository::balance::{self, BalanceDeltas, TransactionRow};
use crate::db::repository::catalog;
use crate::utils::money::{from_cents, positive_cents};
use rust_decimal::Decimal;
use shared::models::{
    BalanceField, BalanceReconciliation, ReferenceKind, TransactionType, VendorBalance,
    VendorBalanceTransaction,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

/// The seven balance transitions; there is no other way to move value
/// between the fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceOp {
    /// Order placed: pending and earnings grow
    Hold,
    /// Order delivered: pending moves to available
    Release,
    /// Order cancelled before shipping: hold undone
    RefundFunds,
    /// Post-delivery refund created
    DebitForRefund,
    /// Refund rejected or cancelled
    CreditFunds,
    /// Available moves to pending until the payout is processed
    PayoutRequest,
    /// Pending leaves the platform
    PayoutProcessed,
}

impl BalanceOp {
    pub fn transaction_type(self) -> TransactionType {
        match self {
            BalanceOp::Hold => TransactionType::Hold,
            BalanceOp::Release => TransactionType::Release,
            BalanceOp::RefundFunds => TransactionType::Refund,
            BalanceOp::DebitForRefund => TransactionType::Debit,
            BalanceOp::CreditFunds => TransactionType::Credit,
            BalanceOp::PayoutRequest | BalanceOp::PayoutProcessed => TransactionType::Payout,
        }
    }

    /// Field whose before/after the transaction row snapshots. For the
    /// operations with a precondition this is also the guarded field.
    pub fn field(self) -> BalanceField {
        match self {
            BalanceOp::Hold
            | BalanceOp::Release
            | BalanceOp::RefundFunds
            | BalanceOp::PayoutProcessed => BalanceField::Pending,
            BalanceOp::DebitForRefund | BalanceOp::CreditFunds | BalanceOp::PayoutRequest => {
                BalanceField::Available
            }
        }
    }

    /// Signed change to each field for `cents`
    pub fn deltas(self, cents: i64) -> BalanceDeltas {
        let (available, pending, earnings, paid_out) = match self {
            BalanceOp::Hold => (0, cents, cents, 0),
            BalanceOp::Release => (cents, -cents, 0, 0),
            BalanceOp::RefundFunds => (0, -cents, -cents, 0),
            BalanceOp::DebitForRefund => (-cents, 0, -cents, 0),
            BalanceOp::CreditFunds => (cents, 0, cents, 0),
            BalanceOp::PayoutRequest => (-cents, cents, 0, 0),
            BalanceOp::PayoutProcessed => (0, -cents, 0, cents),
        };
        BalanceDeltas {
            available,
            pending,
            earnings,
            paid_out,
        }
    }

    /// Inverse of (`transaction_type`, `field`) for a stored row
    pub fn from_row(transaction_type: TransactionType, field: BalanceField) -> Option<Self> {
        match (transaction_type, field) {
            (TransactionType::Hold, _) => Some(BalanceOp::Hold),
            (TransactionType::Release, _) => Some(BalanceOp::Release),
            (TransactionType::Refund, _) => Some(BalanceOp::RefundFunds),
            (TransactionType::Debit, _) => Some(BalanceOp::DebitForRefund),
            (TransactionType::Credit, _) => Some(BalanceOp::CreditFunds),
            (TransactionType::Payout, BalanceField::Available) => Some(BalanceOp::PayoutRequest),
            (TransactionType::Payout, BalanceField::Pending) => Some(BalanceOp::PayoutProcessed),
            (TransactionType::Payout, _) => None,
        }
    }
}

/// Apply `op` for `amount` inside the caller's transaction
pub async fn apply_in(
    conn: &mut SqliteConnection,
    organization_id: i64,
    op: BalanceOp,
    amount: Decimal,
    reference_type: ReferenceKind,
    reference_id: i64,
    description: Option<&str>,
) -> BalanceResult<VendorBalanceTransaction> {
    let cents = positive_cents(amount)?;
    let now = now_millis();
    let deltas = op.deltas(cents);
    let field = op.field();

    if !catalog::organization_exists(conn, organization_id).await? {
        return Err(BalanceError::OrganizationNotFound(organization_id));
    }
    balance::ensure(conn, organization_id, now).await?;
    let Some(after) = balance::try_apply(conn, organization_id, deltas, now).await? else {
        let current = balance::find(conn, organization_id).await?;
        let guard = [
            BalanceField::Available,
            BalanceField::Pending,
            BalanceField::TotalEarnings,
            BalanceField::TotalPaidOut,
        ]
        .into_iter()
        .find(|f| current.is_some_and(|row| row.field(*f) + deltas.field(*f) < 0))
        .unwrap_or(field);
        return Err(BalanceError::InsufficientBalance {
            organization_id,
            field: guard,
            required: amount,
            available: from_cents(current.map(|row| row.field(guard)).unwrap_or(0)),
        });
    };

    let balance_after = after.field(field);
    let row = TransactionRow {
        id: snowflake_id(),
        organization_id,
        transaction_type: op.transaction_type(),
        balance_field: field,
        amount: cents,
        balance_before: balance_after - deltas.field(field),
        balance_after,
        reference_type,
        reference_id,
        description: description.map(str::to_string),
        created_at: now,
    };
    balance::insert_transaction(conn, &row).await?;
    Ok(row.into_model())
}

/// Balance ledger bound to a pool
#[derive(Debug, Clone)]
pub struct BalanceLedger {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl BalanceLedger {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Run one operation in its own transaction under the retry policy
    pub async fn apply(
        &self,
        organization_id: i64,
        op: BalanceOp,
        amount: Decimal,
        reference_type: ReferenceKind,
        reference_id: i64,
        description: Option<&str>,
    ) -> BalanceResult<VendorBalanceTransaction> {
        let pool = &self.pool;
        let txn = self
            .retry
            .run("balance.apply", move || async move {
                let mut tx = pool.begin().await?;
                let txn = apply_in(
                    &mut tx,
                    organization_id,
                    op,
                    amount,
                    reference_type,
                    reference_id,
                    description,
                )
                .await?;
                tx.commit().await?;
                Ok::<_, BalanceError>(txn)
            })
            .await?;
        tracing::debug!(
            organization_id,
            op = ?op,
            amount = %amount,
            reference_id,
            "Balance transaction recorded"
        );
        Ok(txn)
    }

    pub async fn hold(&self, organization_id: i64, amount: Decimal, order_id: i64) -> BalanceResult<VendorBalanceTransaction> {
        self.apply(organization_id, BalanceOp::Hold, amount, ReferenceKind::Order, order_id, None)
            .await
    }

    pub async fn release(&self, organization_id: i64, amount: Decimal, order_id: i64) -> BalanceResult<VendorBalanceTransaction> {
        self.apply(organization_id, BalanceOp::Release, amount, ReferenceKind::Order, order_id, None)
            .await
    }

    pub async fn refund_funds(
        &self,
        organization_id: i64,
        amount: Decimal,
        order_id: i64,
    ) -> BalanceResult<VendorBalanceTransaction> {
        self.apply(organization_id, BalanceOp::RefundFunds, amount, ReferenceKind::Order, order_id, None)
            .await
    }

    pub async fn debit_for_refund(
        &self,
        organization_id: i64,
        amount: Decimal,
        refund_id: i64,
    ) -> BalanceResult<VendorBalanceTransaction> {
        self.apply(
            organization_id,
            BalanceOp::DebitForRefund,
            amount,
            ReferenceKind::Refund,
            refund_id,
            None,
        )
        .await
    }

    pub async fn credit_funds(
        &self,
        organization_id: i64,
        amount: Decimal,
        refund_id: i64,
    ) -> BalanceResult<VendorBalanceTransaction> {
        self.apply(organization_id, BalanceOp::CreditFunds, amount, ReferenceKind::Refund, refund_id, None)
            .await
    }

    pub async fn payout_request(
        &self,
        organization_id: i64,
        amount: Decimal,
        payout_id: i64,
    ) -> BalanceResult<VendorBalanceTransaction> {
        self.apply(organization_id, BalanceOp::PayoutRequest, amount, ReferenceKind::Payout, payout_id, None)
            .await
    }

    pub async fn payout_processed(
        &self,
        organization_id: i64,
        amount: Decimal,
        payout_id: i64,
    ) -> BalanceResult<VendorBalanceTransaction> {
        self.apply(
            organization_id,
            BalanceOp::PayoutProcessed,
            amount,
            ReferenceKind::Payout,
            payout_id,
            None,
        )
        .await
    }

    /// Current balance; zeroed if the organization never had a transaction
    pub async fn balance(&self, organization_id: i64) -> BalanceResult<VendorBalance> {
        let mut conn = self.pool.acquire().await?;
        Ok(balance::find(&mut conn, organization_id)
            .await?
            .map(|row| row.into_model())
            .unwrap_or_else(|| VendorBalance::empty(organization_id)))
    }

    pub async fn transactions(&self, organization_id: i64) -> BalanceResult<Vec<VendorBalanceTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Ok(balance::list_transactions(&mut conn, organization_id)
            .await?
            .into_iter()
            .map(TransactionRow::into_model)
            .collect())
    }

    /// Fold the log and compare it with the cached balance row
    pub async fn reconcile(&self, organization_id: i64) -> BalanceResult<BalanceReconciliation> {
        let mut tx = self.pool.begin().await?;
        let cached = balance::find(&mut tx, organization_id)
            .await?
            .map(|row| row.into_model())
            .unwrap_or_else(|| VendorBalance::empty(organization_id));
        let log: Vec<VendorBalanceTransaction> = balance::list_transactions(&mut tx, organization_id)
            .await?
            .into_iter()
            .map(TransactionRow::into_model)
            .collect();
        tx.commit().await?;

        let folded = fold::fold(organization_id, &log);
        let consistent = cached.same_totals(&folded);
        if !consistent {
            tracing::error!(
                organization_id,
                cached = ?cached,
                folded = ?folded,
                "Vendor balance does not match its transaction log"
            );
        }
        Ok(BalanceReconciliation {
            organization_id,
            cached,
            folded,
            transaction_count: log.len(),
            consistent,
        })
    }
}
