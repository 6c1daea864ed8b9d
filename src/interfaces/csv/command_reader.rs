use crate::application::command::Command;
use crate::domain::Timestamp;
use crate::domain::account::{AccountId, Amount};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Create,
    Deposit,
    Transfer,
    Pay,
}

/// One raw row: `op, timestamp, account, target, amount`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub op: CommandKind,
    pub timestamp: Timestamp,
    pub account: String,
    pub target: Option<String>,
    pub amount: Option<i64>,
}

impl TryFrom<CommandRecord> for Command {
    type Error = LedgerError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let timestamp = record.timestamp;
        let account_id = AccountId::new(record.account)?;
        let amount = || {
            record
                .amount
                .ok_or_else(|| LedgerError::InvalidOperation("missing amount".to_string()))
                .and_then(Amount::new)
        };

        match record.op {
            CommandKind::Create => Ok(Command::CreateAccount {
                timestamp,
                account_id,
            }),
            CommandKind::Deposit => Ok(Command::Deposit {
                timestamp,
                account_id,
                amount: amount()?,
            }),
            CommandKind::Pay => Ok(Command::Pay {
                timestamp,
                account_id,
                amount: amount()?,
            }),
            CommandKind::Transfer => {
                let target = record.target.ok_or_else(|| {
                    LedgerError::InvalidOperation("transfer without target".to_string())
                })?;
                Ok(Command::Transfer {
                    timestamp,
                    source: account_id,
                    target: AccountId::new(target)?,
                    amount: amount()?,
                })
            }
        }
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<Command>`. Rows are validated here, so a non-positive amount or a
/// transfer without a target surfaces as an error for that row only.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads, deserializes and validates commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize::<CommandRecord>()
            .map(|result| result.map_err(LedgerError::from).and_then(Command::try_from))
    }
}
