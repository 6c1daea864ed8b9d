use super::cashback::{self, CashbackPolicy};
use super::command::{Command, Outcome};
use crate::domain::Timestamp;
use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::ledger::{LedgerEntry, NewLedgerEntry, Operation, PaymentId};
use crate::domain::ports::{LedgerStoreBox, UnitOfWork};
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// The main entry point for money movement.
///
/// `LedgerEngine` runs every operation as one unit of work against the
/// store: lock the touched account rows, settle their due cashback, apply
/// the operation, commit. Any error drops the unit of work, which rolls back
/// everything it staged and releases its locks.
pub struct LedgerEngine {
    store: LedgerStoreBox,
    cashback: CashbackPolicy,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - The transactional store for accounts and the ledger.
    /// * `cashback` - The policy applied to every payment.
    pub fn new(store: LedgerStoreBox, cashback: CashbackPolicy) -> Self {
        Self { store, cashback }
    }

    /// Dispatches a validated command to the matching operation.
    pub async fn execute(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::CreateAccount {
                timestamp,
                account_id,
            } => {
                self.create_account(timestamp, account_id.clone()).await?;
                Ok(Outcome::Created(account_id))
            }
            Command::Deposit {
                timestamp,
                account_id,
                amount,
            } => self
                .deposit(timestamp, &account_id, amount)
                .await
                .map(Outcome::Balance),
            Command::Transfer {
                timestamp,
                source,
                target,
                amount,
            } => self
                .transfer(timestamp, &source, &target, amount)
                .await
                .map(Outcome::Balance),
            Command::Pay {
                timestamp,
                account_id,
                amount,
            } => self
                .pay(timestamp, &account_id, amount)
                .await
                .map(Outcome::Payment),
        }
    }

    /// Creates an account with a zero balance and its `created` ledger row.
    ///
    /// Fails with [`LedgerError::Conflict`] if the id was ever used.
    pub async fn create_account(&self, timestamp: Timestamp, account_id: AccountId) -> Result<()> {
        let mut uow = self.store.begin().await?;
        if uow.lock_account(&account_id).await?.is_some() {
            debug!(account = %account_id, "create rolled back: account exists");
            return Err(LedgerError::Conflict(account_id));
        }

        uow.put_account(Account::new(account_id.clone(), timestamp))?;
        uow.append(NewLedgerEntry::created(account_id.clone(), timestamp));
        uow.commit().await?;

        info!(account = %account_id, timestamp, "account created");
        Ok(())
    }

    /// Deposits `amount` and returns the new balance, which includes any
    /// cashback settled by the same unit of work.
    pub async fn deposit(&self, timestamp: Timestamp, account_id: &AccountId, amount: Amount) -> Result<Balance> {
        let mut uow = self.store.begin().await?;
        let mut account = uow
            .lock_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(account_id.clone()))?;
        cashback::settle_due(uow.as_mut(), &mut account, timestamp).await?;

        account.credit(amount)?;
        uow.append(NewLedgerEntry::new(
            account_id.clone(),
            timestamp,
            Operation::Deposited,
            amount.value(),
        ));
        let balance = account.balance;
        uow.put_account(account)?;
        uow.commit().await?;

        info!(account = %account_id, amount = amount.value(), %balance, "deposit committed");
        Ok(balance)
    }

    /// Moves `amount` from `source` to `target` and returns the source's new
    /// balance.
    ///
    /// Rows are locked in ascending id order regardless of argument order, so
    /// crossing transfers cannot deadlock.
    pub async fn transfer(
        &self,
        timestamp: Timestamp,
        source: &AccountId,
        target: &AccountId,
        amount: Amount,
    ) -> Result<Balance> {
        if source == target {
            return Err(LedgerError::InvalidOperation(format!(
                "cannot transfer from account {source} to itself"
            )));
        }

        let mut uow = self.store.begin().await?;
        let mut rows = lock_in_order(uow.as_mut(), &[source, target])
            .await?
            .into_iter();
        let mut from = rows
            .next()
            .flatten()
            .ok_or_else(|| LedgerError::NotFound(source.clone()))?;
        let mut to = rows
            .next()
            .flatten()
            .ok_or_else(|| LedgerError::NotFound(target.clone()))?;

        cashback::settle_due(uow.as_mut(), &mut from, timestamp).await?;
        cashback::settle_due(uow.as_mut(), &mut to, timestamp).await?;

        from.debit(amount)?;
        to.credit(amount)?;
        uow.append(NewLedgerEntry::new(
            source.clone(),
            timestamp,
            Operation::TransferredOut,
            -amount.value(),
        ));
        uow.append(NewLedgerEntry::new(
            target.clone(),
            timestamp,
            Operation::TransferredIn,
            amount.value(),
        ));
        let balance = from.balance;
        uow.put_account(from)?;
        uow.put_account(to)?;
        uow.commit().await?;

        info!(
            source = %source,
            target = %target,
            amount = amount.value(),
            %balance,
            "transfer committed"
        );
        Ok(balance)
    }

    /// Debits a payment and schedules its cashback.
    ///
    /// The cashback row is recorded as pending with its due time as
    /// timestamp; it reaches the balance only when a later operation on the
    /// account settles it.
    pub async fn pay(&self, timestamp: Timestamp, account_id: &AccountId, amount: Amount) -> Result<PaymentId> {
        let due_at = self.cashback.due_at(timestamp)?;

        let mut uow = self.store.begin().await?;
        let mut account = uow
            .lock_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(account_id.clone()))?;
        cashback::settle_due(uow.as_mut(), &mut account, timestamp).await?;

        account.debit(amount)?;
        let payment_id = uow.next_payment_id().await?;
        let cashback_amount = self.cashback.amount_for(amount);
        uow.append(NewLedgerEntry::new(
            account_id.clone(),
            timestamp,
            Operation::Payment(payment_id),
            -amount.value(),
        ));
        uow.append(NewLedgerEntry::cashback(
            account_id.clone(),
            due_at,
            cashback_amount,
            payment_id,
        ));
        uow.put_account(account)?;
        uow.commit().await?;

        info!(
            account = %account_id,
            payment = %payment_id,
            amount = amount.value(),
            cashback = cashback_amount,
            due_at,
            "payment committed"
        );
        Ok(payment_id)
    }

    /// All account ids, in ascending order.
    pub async fn get_accounts(&self) -> Result<Vec<AccountId>> {
        Ok(self
            .store
            .all_accounts()
            .await?
            .into_iter()
            .map(|a| a.account_id)
            .collect())
    }

    /// Point read of the committed balance.
    pub async fn get_balance(&self, account_id: &AccountId) -> Result<Balance> {
        self.store
            .account(account_id)
            .await?
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::NotFound(account_id.clone()))
    }

    /// Ledger rows of `account_id` from `since` on, ordered by
    /// `(timestamp, transaction_id)`.
    pub async fn get_transactions(&self, account_id: &AccountId, since: Timestamp) -> Result<Vec<LedgerEntry>> {
        if self.store.account(account_id).await?.is_none() {
            return Err(LedgerError::NotFound(account_id.clone()));
        }
        self.store.entries(account_id, since).await
    }

    /// Consumes the engine and returns the final state of all accounts.
    pub async fn into_results(self) -> Result<Vec<Account>> {
        self.store.all_accounts().await
    }
}

/// Locks every distinct id in ascending order and returns the rows in the
/// order they were requested.
async fn lock_in_order(uow: &mut dyn UnitOfWork, ids: &[&AccountId]) -> Result<Vec<Option<Account>>> {
    let mut order = ids.to_vec();
    order.sort();
    order.dedup();

    let mut rows = HashMap::with_capacity(order.len());
    for id in order {
        rows.insert(id, uow.lock_account(id).await?);
    }
    Ok(ids
        .iter()
        .map(|id| rows.get(id).cloned().flatten())
        .collect())
}
