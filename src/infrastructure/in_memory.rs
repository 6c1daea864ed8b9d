use super::locks::RowLocks;
use super::staging::Staged;
use crate::domain::account::{Account, AccountId};
use crate::domain::ledger::{LedgerEntry, NewLedgerEntry, PaymentId};
use crate::domain::ports::{LedgerStore, UnitOfWork, UnitOfWorkBox};
use crate::domain::{Timestamp, TransactionId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

type QueueKey = (AccountId, Timestamp, TransactionId);

/// Committed state of the in-memory store.
#[derive(Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, Account>,
    entries: BTreeMap<TransactionId, LedgerEntry>,
    /// Per-account index ordered by `(timestamp, transaction_id)`.
    by_account: BTreeSet<QueueKey>,
    /// Pending cashback work queue keyed by account and due time.
    pending_cashback: BTreeSet<QueueKey>,
    last_transaction_id: TransactionId,
}

impl LedgerState {
    fn insert_entry(&mut self, entry: NewLedgerEntry) {
        self.last_transaction_id += 1;
        let entry = entry.into_entry(self.last_transaction_id);
        let key = (entry.account_id.clone(), entry.timestamp, entry.transaction_id);
        if entry.is_pending_cashback() {
            self.pending_cashback.insert(key.clone());
        }
        self.by_account.insert(key);
        self.entries.insert(entry.transaction_id, entry);
    }

    fn settle(&mut self, settled: LedgerEntry) {
        self.pending_cashback.remove(&(
            settled.account_id.clone(),
            settled.timestamp,
            settled.transaction_id,
        ));
        self.entries.insert(settled.transaction_id, settled);
    }

    fn slice(&self, account_id: &AccountId, from: Timestamp, to: Timestamp, index: &BTreeSet<QueueKey>) -> Vec<LedgerEntry> {
        index
            .range((account_id.clone(), from, 0)..=(account_id.clone(), to, TransactionId::MAX))
            .filter_map(|(_, _, id)| self.entries.get(id).cloned())
            .collect()
    }
}

/// A thread-safe in-memory ledger store.
///
/// Committed state lives behind one `RwLock`; row locks come from a shared
/// [`RowLocks`] table so units of work touching disjoint accounts proceed
/// concurrently. Ideal for testing or when persistence is not required.
#[derive(Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
    locks: RowLocks,
    payment_seq: Arc<AtomicU64>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_secs(5))
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::default(),
            locks: RowLocks::new(lock_timeout),
            payment_seq: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        Ok(Box::new(InMemoryUnitOfWork {
            state: self.state.clone(),
            payment_seq: self.payment_seq.clone(),
            staged: Staged::new(self.locks.clone()),
        }))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(account_id).cloned())
    }

    async fn entries(&self, account_id: &AccountId, since: Timestamp) -> Result<Vec<LedgerEntry>> {
        let state = self.state.read().await;
        Ok(state.slice(account_id, since, Timestamp::MAX, &state.by_account))
    }
}

pub struct InMemoryUnitOfWork {
    state: Arc<RwLock<LedgerState>>,
    payment_seq: Arc<AtomicU64>,
    staged: Staged,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_account(&mut self, account_id: &AccountId) -> Result<Option<Account>> {
        if let Some(row) = self.staged.locked_row(account_id) {
            return Ok(row);
        }
        self.staged.lock(account_id).await?;
        let row = self.state.read().await.accounts.get(account_id).cloned();
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
        let state = self.state.read().await;
        let due = state
            .slice(account_id, Timestamp::MIN, now, &state.pending_cashback)
            .into_iter()
            .filter(|e| !self.staged.is_settled(e.transaction_id))
            .collect();
        Ok(due)
    }

    fn mark_deposited(&mut self, entry: &LedgerEntry) -> Result<()> {
        self.staged.mark_deposited(entry)
    }

    async fn next_payment_id(&mut self) -> Result<PaymentId> {
        Ok(PaymentId(self.payment_seq.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryUnitOfWork { state, staged, .. } = *self;
        let commit = staged.into_commit_set();
        if commit.is_empty() {
            return Ok(());
        }
        let mut state = state.write().await;
        for account in commit.accounts.iter().cloned() {
            state.accounts.insert(account.account_id.clone(), account);
        }
        for settled in commit.settled.iter().cloned() {
            state.settle(settled);
        }
        for entry in commit.entries.iter().cloned() {
            state.insert_entry(entry);
        }
        // Row locks are released when `commit` drops, after the state lock.
        drop(state);
        Ok(())
    }
}
