use cashledger::application::cashback::CashbackPolicy;
use cashledger::application::engine::LedgerEngine;
use cashledger::domain::account::{AccountId, Balance};
use cashledger::domain::ports::{LedgerStoreBox, LedgerStoreFactory};
use cashledger::infrastructure::in_memory::InMemoryLedgerStore;

#[tokio::test]
async fn test_factory_instantiation() {
    let factory: LedgerStoreFactory =
        Box::new(|| Box::new(InMemoryLedgerStore::new()) as LedgerStoreBox);

    let engine = LedgerEngine::new(factory(), CashbackPolicy::default());
    engine.create_account(0, AccountId::from("alice")).await.unwrap();

    // Each factory call yields an independent store
    let other = LedgerEngine::new(factory(), CashbackPolicy::default());
    assert!(other.get_accounts().await.unwrap().is_empty());
    assert_eq!(
        engine.get_balance(&AccountId::from("alice")).await.unwrap(),
        Balance::ZERO
    );
}

#[tokio::test]
async fn test_factory_in_task() {
    let factory: LedgerStoreFactory =
        Box::new(|| Box::new(InMemoryLedgerStore::new()) as LedgerStoreBox);

    let handle = tokio::spawn(async move {
        let engine = LedgerEngine::new(factory(), CashbackPolicy::default());
        engine.create_account(0, AccountId::from("bob")).await.unwrap();
        engine.get_accounts().await.unwrap()
    });

    let ids = handle.await.unwrap();
    assert_eq!(ids, vec![AccountId::from("bob")]);
}
