use crate::domain::account::AccountId;
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>>;

/// An exclusive lock on one account row. Released on drop.
///
/// The last guard of a row with no waiters also removes the row from the
/// lock table, so the table only holds ids that are locked or contended.
pub struct RowGuard {
    account_id: AccountId,
    table: LockTable,
    guard: OwnedMutexGuard<()>,
}

impl Drop for RowGuard {
    fn drop(&mut self) {
        forget_if_idle(
            &self.table,
            &self.account_id,
            OwnedMutexGuard::mutex(&self.guard),
        );
    }
}

/// Removes `row` from the table when the caller's reference and the table's
/// are the only ones left. Any other reference is a holder or a waiter.
fn forget_if_idle(table: &LockTable, account_id: &AccountId, row: &Arc<AsyncMutex<()>>) {
    let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
    let idle = table
        .get(account_id)
        .is_some_and(|entry| Arc::ptr_eq(entry, row) && Arc::strong_count(row) == 2);
    if idle {
        table.remove(account_id);
    }
}

/// Per-account exclusive locks, the equivalent of `SELECT ... FOR UPDATE`.
///
/// Keys are locked whether or not the row exists, so a create and any other
/// operation on the same id serialize. Waiters are served in FIFO order; a
/// waiter that exceeds the timeout gets [`LedgerError::Unavailable`].
#[derive(Clone)]
pub struct RowLocks {
    table: LockTable,
    timeout: Duration,
}

impl RowLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: Arc::default(),
            timeout,
        }
    }

    pub async fn acquire(&self, account_id: &AccountId) -> Result<RowGuard> {
        let row = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(account_id.clone()).or_default().clone()
        };

        let waited = tokio::time::timeout(self.timeout, row.clone().lock_owned()).await;
        let guard = match waited {
            Ok(guard) => guard,
            Err(_) => {
                // The holder may have released between our timeout and now.
                forget_if_idle(&self.table, account_id, &row);
                return Err(LedgerError::Unavailable(format!(
                    "lock wait timeout on account {account_id} after {:?}",
                    self.timeout
                )));
            }
        };
        Ok(RowGuard {
            account_id: account_id.clone(),
            table: self.table.clone(),
            guard,
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RowLocks {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
