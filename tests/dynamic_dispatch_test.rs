use cashledger::domain::account::{Account, AccountId};
use cashledger::domain::ledger::NewLedgerEntry;
use cashledger::domain::ports::LedgerStoreBox;
use cashledger::infrastructure::in_memory::InMemoryLedgerStore;
use std::sync::Arc;

#[tokio::test]
async fn test_store_as_trait_object() {
    let store: Arc<LedgerStoreBox> = Arc::new(Box::new(InMemoryLedgerStore::new()));

    // Verify Send + Sync by running units of work on spawned tasks
    let mut handles = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let id = AccountId::from(name);
            let mut uow = store.begin().await.unwrap();
            uow.lock_account(&id).await.unwrap();
            uow.put_account(Account::new(id.clone(), 0)).unwrap();
            uow.append(NewLedgerEntry::created(id, 0));
            uow.commit().await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let accounts = store.all_accounts().await.unwrap();
    let ids: Vec<_> = accounts.iter().map(|a| a.account_id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob", "carol"]);

    // Transaction ids are unique across the concurrent commits
    let mut tx_ids = Vec::new();
    for account in &accounts {
        for entry in store.entries(&account.account_id, 0).await.unwrap() {
            tx_ids.push(entry.transaction_id);
        }
    }
    tx_ids.sort();
    assert_eq!(tx_ids, vec![1, 2, 3]);
}
