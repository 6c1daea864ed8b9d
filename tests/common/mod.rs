#![allow(dead_code)]

use cashledger::application::cashback::CashbackPolicy;
use cashledger::application::engine::LedgerEngine;
use cashledger::domain::account::{AccountId, Amount};
use cashledger::infrastructure::in_memory::InMemoryLedgerStore;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub fn engine() -> LedgerEngine {
    LedgerEngine::new(
        Box::new(InMemoryLedgerStore::new()),
        CashbackPolicy::default(),
    )
}

pub fn id(s: &str) -> AccountId {
    AccountId::from(s)
}

pub fn amount(v: i64) -> Amount {
    Amount::new(v).unwrap()
}

/// Writes `accounts` creates, one funding deposit each, then `rows`
/// transfers cycling through the accounts.
pub fn generate_csv(path: &Path, accounts: usize, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["op", "timestamp", "account", "target", "amount"])?;

    for a in 0..accounts {
        wtr.write_record(["create", "0", &format!("acc{a}"), "", ""])?;
        wtr.write_record(["deposit", "1", &format!("acc{a}"), "", "1000"])?;
    }
    for i in 0..rows {
        let source = format!("acc{}", i % accounts);
        let target = format!("acc{}", (i + 1) % accounts);
        wtr.write_record([
            "transfer",
            &(i + 2).to_string(),
            &source,
            &target,
            "1",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn generate_large_csv(path: &Path, size_mb: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["op", "timestamp", "account", "target", "amount"])?;
    wtr.write_record(["create", "0", "acc0", "", ""])?;

    let target_size = (size_mb * 1024 * 1024) as u64;
    let mut ts: u64 = 1;

    // Check size every 5000 rows to avoid syscall overhead
    loop {
        for _ in 0..5000 {
            wtr.write_record(["deposit", &ts.to_string(), "acc0", "", "1"])?;
            ts += 1;
        }
        wtr.flush()?; // Flush to ensure file size is updated
        if std::fs::metadata(path)?.len() >= target_size {
            break;
        }
    }
    Ok(())
}
