use crate::domain::account::Account;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct AccountRecord<'a> {
    account: &'a str,
    balance: i64,
    created_at: i64,
}

/// Writes the final account table as CSV: `account,balance,created_at`.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, accounts: impl IntoIterator<Item = Account>) -> Result<()> {
        let mut wrote_any = false;
        for account in accounts {
            self.writer.serialize(AccountRecord {
                account: account.account_id.as_str(),
                balance: account.balance.value(),
                created_at: account.created_at,
            })?;
            wrote_any = true;
        }
        if !wrote_any {
            self.writer.write_record(["account", "balance", "created_at"])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
