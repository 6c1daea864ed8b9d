use cashledger::application::engine::LedgerEngine;
use cashledger::config::EngineConfig;
use cashledger::domain::Timestamp;
use cashledger::domain::account::AccountId;
use cashledger::domain::ports::LedgerStoreBox;
use cashledger::infrastructure::in_memory::InMemoryLedgerStore;
#[cfg(feature = "storage-rocksdb")]
use cashledger::infrastructure::rocksdb::RocksDBStore;
use cashledger::interfaces::csv::account_writer::AccountWriter;
use cashledger::interfaces::csv::command_reader::CommandReader;
use cashledger::logging::init_logging;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file (op, timestamp, account, target, amount)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Engine configuration as JSON (optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print this account's ledger as JSON instead of the account table
    #[arg(long)]
    history: Option<String>,

    /// Only include ledger rows at or after this timestamp
    #[arg(long, default_value_t = 0, requires = "history", allow_hyphen_values = true)]
    since: Timestamp,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn open_store(db_path: Option<PathBuf>, config: &EngineConfig) -> Result<LedgerStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Box::new(RocksDBStore::open_with_lock_timeout(
            path,
            config.lock_timeout(),
        )?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryLedgerStore::with_lock_timeout(
                config.lock_timeout(),
            )))
        }
        None => Ok(Box::new(InMemoryLedgerStore::with_lock_timeout(
            config.lock_timeout(),
        ))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let store = open_store(cli.db_path, &config)?;
    let engine = LedgerEngine::new(store, config.cashback_policy());

    // Process commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (index, command) in reader.commands().enumerate() {
        let row = index + 1;
        match command {
            Ok(command) => match engine.execute(command).await {
                Ok(outcome) => debug!(row, %outcome, "command applied"),
                Err(e) => warn!(row, error = %e, "Error processing command"),
            },
            Err(e) => warn!(row, error = %e, "Error reading command"),
        }
    }

    let stdout = io::stdout();
    if let Some(account) = cli.history {
        let entries = engine
            .get_transactions(&AccountId::new(account)?, cli.since)
            .await?;
        serde_json::to_writer_pretty(stdout.lock(), &entries).into_diagnostic()?;
        println!();
        return Ok(());
    }

    // Output final state
    let accounts = engine.into_results().await?;
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts)?;

    Ok(())
}
