use super::locks::{RowGuard, RowLocks};
use crate::domain::TransactionId;
use crate::domain::account::{Account, AccountId};
use crate::domain::ledger::{LedgerEntry, NewLedgerEntry};
use crate::error::{LedgerError, Result};
use std::collections::{BTreeMap, HashSet};

/// Writes buffered by a unit of work until commit, plus the row locks it holds.
///
/// Both storage adapters share this; they differ only in how they read
/// committed state and how they apply a commit.
pub struct Staged {
    locks: RowLocks,
    guards: Vec<RowGuard>,
    rows: BTreeMap<AccountId, Option<Account>>,
    dirty: HashSet<AccountId>,
    entries: Vec<NewLedgerEntry>,
    settled: Vec<LedgerEntry>,
    settled_ids: HashSet<TransactionId>,
}

impl Staged {
    pub fn new(locks: RowLocks) -> Self {
        Self {
            locks,
            guards: Vec::new(),
            rows: BTreeMap::new(),
            dirty: HashSet::new(),
            entries: Vec::new(),
            settled: Vec::new(),
            settled_ids: HashSet::new(),
        }
    }

    /// The row as this unit sees it, if it is already locked by this unit.
    pub fn locked_row(&self, account_id: &AccountId) -> Option<Option<Account>> {
        self.rows.get(account_id).cloned()
    }

    /// Takes the row lock. The caller reads committed state only after this
    /// returns, so the read happens under the lock.
    pub async fn lock(&mut self, account_id: &AccountId) -> Result<()> {
        let guard = self.locks.acquire(account_id).await?;
        self.guards.push(guard);
        Ok(())
    }

    pub fn track(&mut self, account_id: AccountId, row: Option<Account>) {
        self.rows.insert(account_id, row);
    }

    pub fn put_account(&mut self, account: Account) -> Result<()> {
        let Some(row) = self.rows.get_mut(&account.account_id) else {
            return Err(LedgerError::internal(format!(
                "account {} written without holding its lock",
                account.account_id
            )));
        };
        self.dirty.insert(account.account_id.clone());
        *row = Some(account);
        Ok(())
    }

    pub fn append(&mut self, entry: NewLedgerEntry) {
        self.entries.push(entry);
    }

    pub fn mark_deposited(&mut self, entry: &LedgerEntry) -> Result<()> {
        if !entry.is_pending_cashback() {
            return Err(LedgerError::internal(format!(
                "ledger row {} is not a pending cashback",
                entry.transaction_id
            )));
        }
        if !self.rows.contains_key(&entry.account_id) {
            return Err(LedgerError::internal(format!(
                "cashback {} settled without holding the lock on {}",
                entry.transaction_id, entry.account_id
            )));
        }
        if self.is_settled(entry.transaction_id) {
            return Err(LedgerError::internal(format!(
                "cashback {} settled twice",
                entry.transaction_id
            )));
        }
        let mut settled = entry.clone();
        settled.deposited = Some(true);
        self.settled_ids.insert(settled.transaction_id);
        self.settled.push(settled);
        Ok(())
    }

    pub fn is_settled(&self, transaction_id: TransactionId) -> bool {
        self.settled_ids.contains(&transaction_id)
    }

    /// Consumes the buffer, yielding the rows to write. Locks stay held by the
    /// returned [`CommitSet`] until it is dropped.
    pub fn into_commit_set(self) -> CommitSet {
        let accounts = self
            .rows
            .into_iter()
            .filter(|(id, _)| self.dirty.contains(id))
            .filter_map(|(_, row)| row)
            .collect();
        CommitSet {
            accounts,
            entries: self.entries,
            settled: self.settled,
            _guards: self.guards,
        }
    }
}

pub struct CommitSet {
    pub accounts: Vec<Account>,
    pub entries: Vec<NewLedgerEntry>,
    pub settled: Vec<LedgerEntry>,
    _guards: Vec<RowGuard>,
}

impl CommitSet {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.entries.is_empty() && self.settled.is_empty()
    }
}
