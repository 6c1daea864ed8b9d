use super::account::AccountId;
use super::{Timestamp, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sequential payment identifier, rendered as `payment{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PaymentId(pub u64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payment{}", self.0)
    }
}

impl FromStr for PaymentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("payment")
            .and_then(|n| n.parse().ok())
            .map(PaymentId)
            .ok_or_else(|| format!("invalid payment id: {s}"))
    }
}

impl From<PaymentId> for String {
    fn from(id: PaymentId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for PaymentId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The kind of balance-affecting event a ledger row records.
///
/// Payments carry their own identifier, so the persisted operation name of a
/// payment row is the payment id itself (`payment7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Operation {
    Created,
    Deposited,
    TransferredOut,
    TransferredIn,
    Payment(PaymentId),
    Cashback,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Created => f.write_str("created"),
            Operation::Deposited => f.write_str("deposited"),
            Operation::TransferredOut => f.write_str("transferred_out"),
            Operation::TransferredIn => f.write_str("transferred_in"),
            Operation::Payment(id) => id.fmt(f),
            Operation::Cashback => f.write_str("cashback"),
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Operation::Created),
            "deposited" => Ok(Operation::Deposited),
            "transferred_out" => Ok(Operation::TransferredOut),
            "transferred_in" => Ok(Operation::TransferredIn),
            "cashback" => Ok(Operation::Cashback),
            other => other
                .parse::<PaymentId>()
                .map(Operation::Payment)
                .map_err(|_| format!("unknown operation: {other}")),
        }
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        op.to_string()
    }
}

impl TryFrom<String> for Operation {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A committed, immutable ledger row.
///
/// For cashback rows `timestamp` is the due time and `deposited` tracks
/// settlement; every other row has `deposited == None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub timestamp: Timestamp,
    pub operation: Operation,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payment_ref: Option<PaymentId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deposited: Option<bool>,
}

impl LedgerEntry {
    pub fn is_pending_cashback(&self) -> bool {
        self.operation == Operation::Cashback && self.deposited == Some(false)
    }

    /// The amount this row contributes to the account balance right now.
    pub fn balance_effect(&self) -> i64 {
        match self.operation {
            Operation::Cashback if self.deposited != Some(true) => 0,
            _ => self.amount,
        }
    }

    /// Ordering used for settlement and history: `(timestamp, transaction_id)`.
    pub fn sort_key(&self) -> (Timestamp, TransactionId) {
        (self.timestamp, self.transaction_id)
    }
}

/// A ledger row staged inside a unit of work. Storage assigns the
/// transaction id when the unit commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub account_id: AccountId,
    pub timestamp: Timestamp,
    pub operation: Operation,
    pub amount: i64,
    pub payment_ref: Option<PaymentId>,
    pub deposited: Option<bool>,
}

impl NewLedgerEntry {
    pub fn new(account_id: AccountId, timestamp: Timestamp, operation: Operation, amount: i64) -> Self {
        Self {
            account_id,
            timestamp,
            operation,
            amount,
            payment_ref: None,
            deposited: None,
        }
    }

    pub fn created(account_id: AccountId, timestamp: Timestamp) -> Self {
        Self::new(account_id, timestamp, Operation::Created, 0)
    }

    /// A pending cashback credit for `payment`, due at `due_at`.
    pub fn cashback(account_id: AccountId, due_at: Timestamp, amount: i64, payment: PaymentId) -> Self {
        Self {
            account_id,
            timestamp: due_at,
            operation: Operation::Cashback,
            amount,
            payment_ref: Some(payment),
            deposited: Some(false),
        }
    }

    pub fn into_entry(self, transaction_id: TransactionId) -> LedgerEntry {
        LedgerEntry {
            transaction_id,
            account_id: self.account_id,
            timestamp: self.timestamp,
            operation: self.operation,
            amount: self.amount,
            payment_ref: self.payment_ref,
            deposited: self.deposited,
        }
    }
}
