use super::Timestamp;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned account identifier. Never reused once created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(LedgerError::InvalidOperation(
                "Account id must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A balance in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub i64);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn value(&self) -> i64 {
        self.0
    }

    fn checked_add(self, delta: i64) -> Result<Self> {
        self.0.checked_add(delta).map(Self).ok_or_else(|| {
            LedgerError::InvalidOperation("Balance overflow".to_string())
        })
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a positive monetary amount for money-movement operations.
///
/// Non-positive amounts are rejected here, at the boundary, so the engine
/// never has to re-check them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidOperation(format!(
                "Amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// The materialized row of an account.
///
/// `balance` is a fold over the account's committed ledger slice; it is only
/// ever changed together with the ledger rows that explain the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub created_at: Timestamp,
    pub balance: Balance,
}

impl Account {
    pub fn new(account_id: AccountId, created_at: Timestamp) -> Self {
        Self {
            account_id,
            created_at,
            balance: Balance::ZERO,
        }
    }

    /// Credits a deposit or an incoming transfer.
    pub fn credit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.checked_add(amount.value())?;
        Ok(())
    }

    /// Debits funds if the balance covers them. Leaves the account untouched otherwise.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        if self.balance.value() < amount.value() {
            return Err(LedgerError::InsufficientFunds {
                account: self.account_id.clone(),
                balance: self.balance.value(),
                requested: amount.value(),
            });
        }
        self.balance = self.balance.checked_add(-amount.value())?;
        Ok(())
    }

    /// Realizes a settled cashback. Cashback amounts may be zero.
    pub fn apply_cashback(&mut self, amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(LedgerError::internal(format!(
                "negative cashback {amount} for account {}",
                self.account_id
            )));
        }
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }
}
