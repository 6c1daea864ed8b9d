use super::locks::RowLocks;
use super::staging::Staged;
use crate::domain::account::{Account, AccountId};
use crate::domain::ledger::{LedgerEntry, NewLedgerEntry, PaymentId};
use crate::domain::ports::{LedgerStore, UnitOfWork, UnitOfWorkBox};
use crate::domain::{Timestamp, TransactionId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Column Family for account rows, keyed by account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for ledger rows, keyed by big-endian transaction id.
pub const CF_LEDGER: &str = "ledger";
/// Per-account index over the ledger, keyed by `(account, timestamp, transaction id)`.
pub const CF_ACCOUNT_LEDGER: &str = "account_ledger";
/// Pending cashback work queue, keyed by `(account, due time, transaction id)`.
pub const CF_PENDING_CASHBACK: &str = "pending_cashback";
/// Sequence high-water marks.
pub const CF_META: &str = "meta";

const META_LAST_TRANSACTION_ID: &[u8] = b"last_transaction_id";
const META_PAYMENT_SEQ: &[u8] = b"payment_seq";

/// A persistent ledger store using RocksDB.
///
/// Every unit of work commits as a single `WriteBatch`, which gives the
/// all-or-nothing guarantee; row locks come from the same [`RowLocks`]
/// table the in-memory store uses. The pending cashback queue is its own
/// column family so settlement is a prefix scan rather than a ledger scan.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    locks: RowLocks,
    /// Serializes commits and holds the last assigned transaction id.
    commit_lock: Arc<Mutex<TransactionId>>,
    payment_seq: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist and restores the
    /// transaction and payment sequences.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_lock_timeout(path, Duration::from_secs(5))
    }

    pub fn open_with_lock_timeout<P: AsRef<Path>>(path: P, lock_timeout: Duration) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [
            CF_ACCOUNTS,
            CF_LEDGER,
            CF_ACCOUNT_LEDGER,
            CF_PENDING_CASHBACK,
            CF_META,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        let meta = cf(&db, CF_META)?;
        let last_transaction_id = read_u64(&db, meta, META_LAST_TRANSACTION_ID)?;
        let payment_seq = read_u64(&db, meta, META_PAYMENT_SEQ)?;

        Ok(Self {
            db: Arc::new(db),
            locks: RowLocks::new(lock_timeout),
            commit_lock: Arc::new(Mutex::new(last_transaction_id)),
            payment_seq: Arc::new(AtomicU64::new(payment_seq)),
        })
    }

    fn account_row(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let accounts = cf(&self.db, CF_ACCOUNTS)?;
        self.db
            .get_cf(accounts, account_id.as_str())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn ledger_row(&self, transaction_id: TransactionId) -> Result<LedgerEntry> {
        let ledger = cf(&self.db, CF_LEDGER)?;
        let bytes = self
            .db
            .get_cf(ledger, transaction_id.to_be_bytes())?
            .ok_or_else(|| {
                LedgerError::internal(format!("dangling ledger index entry {transaction_id}"))
            })?;
        decode(&bytes)
    }

    /// Scans an account-keyed index from `from` up to and including `to`,
    /// resolving each hit to its ledger row.
    fn scan(&self, cf_name: &str, account_id: &AccountId, from: Timestamp, to: Timestamp) -> Result<Vec<LedgerEntry>> {
        let index = cf(&self.db, cf_name)?;
        let prefix = account_prefix(account_id);
        let start = index_key(account_id, from, 0);

        let mut rows = Vec::new();
        for item in self
            .db
            .iterator_cf(index, IteratorMode::From(&start, Direction::Forward))
        {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let (timestamp, transaction_id) = decode_index_suffix(&key[prefix.len()..])?;
            if timestamp > to {
                break;
            }
            rows.push(self.ledger_row(transaction_id)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        Ok(Box::new(RocksDBUnitOfWork {
            store: self.clone(),
            staged: Staged::new(self.locks.clone()),
        }))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let accounts = cf(&self.db, CF_ACCOUNTS)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(accounts, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(decode(&value)?);
        }
        Ok(rows)
    }

    async fn account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.account_row(account_id)
    }

    async fn entries(&self, account_id: &AccountId, since: Timestamp) -> Result<Vec<LedgerEntry>> {
        self.scan(CF_ACCOUNT_LEDGER, account_id, since, Timestamp::MAX)
    }
}

pub struct RocksDBUnitOfWork {
    store: RocksDBStore,
    staged: Staged,
}

#[async_trait]
impl UnitOfWork for RocksDBUnitOfWork {
    async fn lock_account(&mut self, account_id: &AccountId) -> Result<Option<Account>> {
        if let Some(row) = self.staged.locked_row(account_id) {
            return Ok(row);
        }
        self.staged.lock(account_id).await?;
        let row = self.store.account_row(account_id)?;
        self.staged.track(account_id.clone(), row.clone());
        Ok(row)
    }

    fn put_account(&mut self, account: Account) -> Result<()> {
        self.staged.put_account(account)
    }

    fn append(&mut self, entry: NewLedgerEntry) {
        self.staged.append(entry);
    }

    async fn due_cashbacks(&mut self, account_id: &AccountId, now: Timestamp) -> Result<Vec<LedgerEntry>> {
        if self.staged.locked_row(account_id).is_none() {
            return Err(LedgerError::internal(format!(
                "cashback queue of {account_id} scanned without holding its lock"
            )));
        }
        let due = self
            .store
            .scan(CF_PENDING_CASHBACK, account_id, Timestamp::MIN, now)?
            .into_iter()
            .filter(|e| !self.staged.is_settled(e.transaction_id))
            .collect();
        Ok(due)
    }

    fn mark_deposited(&mut self, entry: &LedgerEntry) -> Result<()> {
        self.staged.mark_deposited(entry)
    }

    async fn next_payment_id(&mut self) -> Result<PaymentId> {
        Ok(PaymentId(
            self.store.payment_seq.fetch_add(1, Ordering::SeqCst) + 1,
        ))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let RocksDBUnitOfWork { store, staged } = *self;
        let commit = staged.into_commit_set();
        if commit.is_empty() {
            return Ok(());
        }

        let mut last_transaction_id = store.commit_lock.lock().await;

        let db = &store.db;
        let accounts = cf(db, CF_ACCOUNTS)?;
        let ledger = cf(db, CF_LEDGER)?;
        let account_ledger = cf(db, CF_ACCOUNT_LEDGER)?;
        let pending = cf(db, CF_PENDING_CASHBACK)?;
        let meta = cf(db, CF_META)?;
        let mut next_id = *last_transaction_id;
        let mut batch = WriteBatch::default();

        for account in &commit.accounts {
            batch.put_cf(accounts, account.account_id.as_str(), encode(account)?);
        }
        for settled in &commit.settled {
            batch.put_cf(ledger, settled.transaction_id.to_be_bytes(), encode(settled)?);
            batch.delete_cf(
                pending,
                index_key(&settled.account_id, settled.timestamp, settled.transaction_id),
            );
        }
        for entry in commit.entries.iter().cloned() {
            next_id += 1;
            let entry = entry.into_entry(next_id);
            let key = index_key(&entry.account_id, entry.timestamp, entry.transaction_id);
            if entry.is_pending_cashback() {
                batch.put_cf(pending, &key, b"");
            }
            batch.put_cf(account_ledger, &key, b"");
            batch.put_cf(ledger, next_id.to_be_bytes(), encode(&entry)?);
        }
        batch.put_cf(meta, META_LAST_TRANSACTION_ID, next_id.to_be_bytes());
        batch.put_cf(
            meta,
            META_PAYMENT_SEQ,
            store.payment_seq.load(Ordering::SeqCst).to_be_bytes(),
        );

        db.write(batch)?;
        *last_transaction_id = next_id;
        Ok(())
    }
}

fn cf<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| LedgerError::internal(format!("{name} column family not found")))
}

fn read_u64(db: &DB, cf: &ColumnFamily, key: &[u8]) -> Result<u64> {
    match db.get_cf(cf, key)? {
        Some(bytes) => {
            let raw: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| LedgerError::internal("corrupt sequence value"))?;
            Ok(u64::from_be_bytes(raw))
        }
        None => Ok(0),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        LedgerError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        LedgerError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

/// Length-prefixed account id, so no id is a byte prefix of another's key space.
fn account_prefix(account_id: &AccountId) -> Vec<u8> {
    let id = account_id.as_str().as_bytes();
    let mut key = Vec::with_capacity(4 + id.len() + 16);
    key.extend_from_slice(&(id.len() as u32).to_be_bytes());
    key.extend_from_slice(id);
    key
}

/// Timestamps are signed; flipping the sign bit makes big-endian byte order
/// match numeric order.
fn index_key(account_id: &AccountId, timestamp: Timestamp, transaction_id: TransactionId) -> Vec<u8> {
    let mut key = account_prefix(account_id);
    key.extend_from_slice(&((timestamp as u64) ^ (1 << 63)).to_be_bytes());
    key.extend_from_slice(&transaction_id.to_be_bytes());
    key
}

fn decode_index_suffix(suffix: &[u8]) -> Result<(Timestamp, TransactionId)> {
    let (ts, id) = suffix
        .split_first_chunk::<8>()
        .ok_or_else(|| LedgerError::internal("corrupt index key"))?;
    let id: [u8; 8] = id
        .try_into()
        .map_err(|_| LedgerError::internal("corrupt index key"))?;
    let timestamp = (u64::from_be_bytes(*ts) ^ (1 << 63)) as i64;
    Ok((timestamp, u64::from_be_bytes(id)))
}
