use crate::domain::Timestamp;
use crate::domain::account::{Account, Amount};
use crate::domain::ports::UnitOfWork;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use tracing::debug;

pub const MILLISECONDS_IN_ONE_DAY: i64 = 86_400_000;

/// How much cashback a payment earns and when it becomes payable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashbackPolicy {
    pub rate: Decimal,
    pub delay_ms: i64,
}

impl Default for CashbackPolicy {
    fn default() -> Self {
        Self {
            rate: dec!(0.02),
            delay_ms: MILLISECONDS_IN_ONE_DAY,
        }
    }
}

impl CashbackPolicy {
    /// Cashback for a payment, rounded down to whole minor units.
    pub fn amount_for(&self, payment: Amount) -> i64 {
        (Decimal::from(payment.value()) * self.rate)
            .floor()
            .to_i64()
            .unwrap_or_default()
    }

    pub fn due_at(&self, paid_at: Timestamp) -> Result<Timestamp> {
        paid_at.checked_add(self.delay_ms).ok_or_else(|| {
            LedgerError::InvalidOperation(format!("cashback due time overflows for timestamp {paid_at}"))
        })
    }
}

/// Settles every pending cashback of `account` that is due at `now`.
///
/// Must run inside the unit of work of the operation that triggered it and
/// after that unit locked the account, so settlement commits (or rolls back)
/// together with the operation. Entries are applied in `(timestamp,
/// transaction_id)` order. Returns the total amount credited.
pub async fn settle_due(uow: &mut dyn UnitOfWork, account: &mut Account, now: Timestamp) -> Result<i64> {
    let due = uow.due_cashbacks(&account.account_id, now).await?;
    let mut settled = 0i64;
    for entry in &due {
        account.apply_cashback(entry.amount)?;
        uow.mark_deposited(entry)?;
        settled += entry.amount;
        debug!(
            account = %account.account_id,
            transaction_id = entry.transaction_id,
            payment_ref = ?entry.payment_ref.map(|p| p.to_string()),
            amount = entry.amount,
            "cashback settled"
        );
    }
    if !due.is_empty() {
        uow.put_account(account.clone())?;
    }
    Ok(settled)
}
