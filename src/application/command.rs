use crate::domain::Timestamp;
use crate::domain::account::{AccountId, Amount, Balance};
use crate::domain::ledger::PaymentId;
use std::fmt;

/// A money-movement request, already validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateAccount {
        timestamp: Timestamp,
        account_id: AccountId,
    },
    Deposit {
        timestamp: Timestamp,
        account_id: AccountId,
        amount: Amount,
    },
    Transfer {
        timestamp: Timestamp,
        source: AccountId,
        target: AccountId,
        amount: Amount,
    },
    Pay {
        timestamp: Timestamp,
        account_id: AccountId,
        amount: Amount,
    },
}

/// What a committed command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(AccountId),
    /// Resulting balance of the deposited-to or transferred-from account.
    Balance(Balance),
    Payment(PaymentId),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created(id) => write!(f, "created {id}"),
            Outcome::Balance(balance) => write!(f, "balance {balance}"),
            Outcome::Payment(id) => write!(f, "{id}"),
        }
    }
}
