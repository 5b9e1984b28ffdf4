//! Rebuild a balance from its transaction log

use super::ledger::BalanceOp;
use shared::models::{VendorBalance, VendorBalanceTransaction};

/// Signed fold of `log`; rows whose type/field pair is unknown are skipped
/// with a warning.
pub fn fold(organization_id: i64, log: &[VendorBalanceTransaction]) -> VendorBalance {
    let mut balance = VendorBalance::empty(organization_id);
    for txn in log {
        let Some(op) = BalanceOp::from_row(txn.transaction_type, txn.balance_field) else {
            tracing::warn!(
                organization_id,
                transaction_id = txn.id,
                "Unrecognised balance transaction skipped during fold"
            );
            continue;
        };
        let a = txn.amount;
        match op {
            BalanceOp::Hold => {
                balance.pending_balance += a;
                balance.total_earnings += a;
            }
            BalanceOp::Release => {
                balance.pending_balance -= a;
                balance.available_balance += a;
            }
            BalanceOp::RefundFunds => {
                balance.pending_balance -= a;
                balance.total_earnings -= a;
            }
            BalanceOp::DebitForRefund => {
                balance.available_balance -= a;
                balance.total_earnings -= a;
            }
            BalanceOp::CreditFunds => {
                balance.available_balance += a;
                balance.total_earnings += a;
            }
            BalanceOp::PayoutRequest => {
                balance.available_balance -= a;
                balance.pending_balance += a;
            }
            BalanceOp::PayoutProcessed => {
                balance.pending_balance -= a;
                balance.total_paid_out += a;
            }
        }
        balance.updated_at = txn.created_at;
    }
    balance
}
