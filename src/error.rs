use crate::domain::account::AccountId;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum LedgerError {
    #[error("Account {0} already exists")]
    #[diagnostic(code(ledger::conflict))]
    Conflict(AccountId),
    #[error("Account {0} not found")]
    #[diagnostic(code(ledger::not_found))]
    NotFound(AccountId),
    #[error("Invalid operation: {0}")]
    #[diagnostic(code(ledger::invalid_operation))]
    InvalidOperation(String),
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    #[diagnostic(code(ledger::insufficient_funds))]
    InsufficientFunds {
        account: AccountId,
        balance: i64,
        requested: i64,
    },
    #[error("Storage unavailable: {0}")]
    #[diagnostic(code(ledger::unavailable), help("the operation was rolled back and may be retried"))]
    Unavailable(String),
    #[error("Config error: {0}")]
    #[diagnostic(code(ledger::config))]
    Config(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Status code a request layer should answer with for this outcome.
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Conflict(_) => 409,
            LedgerError::NotFound(_) => 404,
            LedgerError::InvalidOperation(_) | LedgerError::Config(_) => 400,
            LedgerError::InsufficientFunds { .. } => 422,
            LedgerError::Unavailable(_) => 503,
            _ => 500,
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        LedgerError::InternalError(Box::new(std::io::Error::other(message.into())))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(e: rocksdb::Error) -> Self {
        use rocksdb::ErrorKind;
        match e.kind() {
            ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => {
                LedgerError::Unavailable(e.into_string())
            }
            _ => LedgerError::InternalError(Box::new(e)),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
