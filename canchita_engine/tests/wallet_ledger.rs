mod support;

use cnc_common::Money;

use canchita_engine::{
    db_types::LedgerEntryType,
    DebitOutcome,
    SqliteDatabase,
    WalletApi,
    WalletApiError,
};
use support::{prepare_test_env, random_db_path, seed_user};

fn api(db: &SqliteDatabase) -> WalletApi<SqliteDatabase> {
    WalletApi::new(db.clone())
}

#[tokio::test]
async fn balance_always_reconciles_with_the_ledger() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let user = seed_user(&db, "gustavo").await;
    let api = api(&db);

    assert_eq!(api.balance(user).await.unwrap(), Money::from(0));

    api.credit(user, Money::from_units(100), "Top-up", "gateway_topup", Some("payment:t1")).await.unwrap();
    api.credit(user, Money::from_units(50), "Refund", "match_refund", Some("match:9")).await.unwrap();
    let outcome = api.debit(user, Money::from_units(60), "Match entry", "match_join", None).await.unwrap();
    assert!(matches!(outcome, DebitOutcome::Debited(_)));

    let balance = api.balance(user).await.unwrap();
    assert_eq!(balance, Money::from_units(90));

    let history = api.history(user).await.unwrap();
    assert_eq!(history.len(), 3);
    let signed: Money = history.iter().map(|e| e.signed_amount()).sum();
    assert_eq!(signed, balance);
    // Exactly one ledger row per operation, typed by direction.
    assert_eq!(history.iter().filter(|e| e.entry_type == LedgerEntryType::Credit).count(), 2);
    assert_eq!(history.iter().filter(|e| e.entry_type == LedgerEntryType::Debit).count(), 1);
}

#[tokio::test]
async fn overdraw_is_refused_and_leaves_no_trace() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let user = seed_user(&db, "hilda").await;
    let api = api(&db);

    api.credit(user, Money::from_units(30), "Top-up", "gateway_topup", None).await.unwrap();
    let outcome = api.debit(user, Money::from_units(31), "Match entry", "match_join", None).await.unwrap();
    let DebitOutcome::InsufficientFunds { requested, available } = outcome else {
        panic!("expected an overdraw refusal, got {outcome:?}");
    };
    assert_eq!(requested, Money::from_units(31));
    assert_eq!(available, Money::from_units(30));

    assert_eq!(api.balance(user).await.unwrap(), Money::from_units(30));
    assert_eq!(api.history(user).await.unwrap().len(), 1, "the refused debit left no ledger row");

    // Draining to exactly zero is allowed.
    let outcome = api.debit(user, Money::from_units(30), "Match entry", "match_join", None).await.unwrap();
    assert!(matches!(outcome, DebitOutcome::Debited(_)));
    assert_eq!(api.balance(user).await.unwrap(), Money::from(0));
}

#[tokio::test]
async fn amounts_must_be_positive() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let user = seed_user(&db, "ivan").await;
    let api = api(&db);

    let err = api.credit(user, Money::from(0), "noop", "test", None).await.unwrap_err();
    assert!(matches!(err, WalletApiError::NonPositiveAmount(0)));
    let err = api.debit(user, Money::from(-5), "noop", "test", None).await.unwrap_err();
    assert!(matches!(err, WalletApiError::NonPositiveAmount(-5)));
}

#[tokio::test]
async fn wallets_are_created_lazily_per_user() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let a = seed_user(&db, "juana").await;
    let b = seed_user(&db, "karim").await;
    let api = api(&db);

    assert!(api.wallet(a).await.unwrap().is_none());
    api.credit(a, Money::from_units(10), "Top-up", "gateway_topup", None).await.unwrap();
    assert!(api.wallet(a).await.unwrap().is_some());
    // The neighbour's ledger is untouched.
    assert!(api.wallet(b).await.unwrap().is_none());
    assert!(api.history(b).await.unwrap().is_empty());
}
