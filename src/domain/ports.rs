use super::account::{Account, AccountId};
use super::ledger::{LedgerEntry, NewLedgerEntry, PaymentId};
use super::Timestamp;
use crate::error::Result;
use async_trait::async_trait;

/// Transactional storage for accounts and their ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a new atomic unit of work.
    async fn begin(&self) -> Result<UnitOfWorkBox>;
    /// All committed accounts, ordered by id.
    async fn all_accounts(&self) -> Result<Vec<Account>>;
    async fn account(&self, account_id: &AccountId) -> Result<Option<Account>>;
    /// Committed ledger rows of `account_id` with `timestamp >= since`,
    /// ordered by `(timestamp, transaction_id)`.
    async fn entries(&self, account_id: &AccountId, since: Timestamp) -> Result<Vec<LedgerEntry>>;
}

/// One all-or-nothing unit of work.
///
/// Row locks taken through [`UnitOfWork::lock_account`] are held until the
/// unit is committed or dropped. Dropping without committing discards every
/// staged write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Acquires the exclusive lock on `account_id` and returns the row as this
    /// unit sees it. The lock is taken even if the row does not exist.
    async fn lock_account(&mut self, account_id: &AccountId) -> Result<Option<Account>>;
    /// Stages an insert or update of a row previously locked by this unit.
    fn put_account(&mut self, account: Account) -> Result<()>;
    fn append(&mut self, entry: NewLedgerEntry);
    /// Pending cashback rows of `account_id` due at or before `now`, ordered
    /// by `(timestamp, transaction_id)`.
    async fn due_cashbacks(&mut self, account_id: &AccountId, now: Timestamp) -> Result<Vec<LedgerEntry>>;
    /// Stages the one-time `deposited` false -> true transition.
    fn mark_deposited(&mut self, entry: &LedgerEntry) -> Result<()>;
    async fn next_payment_id(&mut self) -> Result<PaymentId>;
    async fn commit(self: Box<Self>) -> Result<()>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type UnitOfWorkBox = Box<dyn UnitOfWork>;
pub type LedgerStoreFactory = Box<dyn Fn() -> LedgerStoreBox + Send + Sync>;
