//! Integration test: provisioning accounts through a local pool.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use account_pool::provision::MAX_CREATE_WORKERS;
use account_pool::storage::EMAIL_ALREADY_EXISTS;
use account_pool::{
    create_accounts, Accounts, CreateAccountRequest, CreateResult, Directory, LocalPool,
    PoolError,
};

fn provision(pool: &LocalPool, requests: Vec<CreateAccountRequest>) -> Vec<CreateResult> {
    let rx = create_accounts(Arc::new(pool.clone()), requests, Duration::from_millis(1))
        .expect("workers should start");
    rx.iter().collect()
}

#[test]
fn provisioning_creates_every_account() {
    let dir = tempfile::tempdir().unwrap();
    let pool = LocalPool::open(dir.path().join("pool.json")).unwrap();

    let requests: Vec<_> = (0..3 * MAX_CREATE_WORKERS)
        .map(|i| CreateAccountRequest::new(format!("ci-{i}"), format!("ci-{i}@example.com")))
        .collect();
    let results = provision(&pool, requests);

    assert_eq!(results.len(), 3 * MAX_CREATE_WORKERS);
    assert!(results.iter().all(CreateResult::is_ok));

    let ids: HashSet<_> = results
        .iter()
        .map(|r| r.outcome.as_ref().unwrap().id.to_string())
        .collect();
    assert_eq!(ids.len(), results.len(), "account ids must be unique");
    assert!(ids.iter().all(|id| id.len() == 12));

    for r in &results {
        let info = r.outcome.as_ref().unwrap();
        assert_eq!(info.name, r.request.name);
        assert_eq!(info.email, r.request.email);
        assert!(r.finished_at >= r.started_at);
    }
    assert_eq!(pool.list_accounts().unwrap().len(), results.len());
}

#[test]
fn provisioning_reports_duplicate_email() {
    let dir = tempfile::tempdir().unwrap();
    let pool = LocalPool::open(dir.path().join("pool.json")).unwrap();
    pool.add_account("existing", "taken@example.com").unwrap();

    let results = provision(
        &pool,
        vec![
            CreateAccountRequest::new("fresh", "fresh@example.com"),
            CreateAccountRequest::new("clash", "taken@example.com"),
        ],
    );
    assert_eq!(results.len(), 2);

    let failed: Vec<_> = results.iter().filter(|r| !r.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].request.name, "clash");
    assert!(matches!(
        &failed[0].outcome,
        Err(PoolError::CreateFailed(reason)) if reason == EMAIL_ALREADY_EXISTS
    ));
    assert_eq!(pool.list_accounts().unwrap().len(), 2);
}

#[test]
fn provisioning_same_email_twice_creates_one() {
    let dir = tempfile::tempdir().unwrap();
    let pool = LocalPool::open(dir.path().join("pool.json")).unwrap();

    let results = provision(
        &pool,
        vec![
            CreateAccountRequest::new("first", "same@example.com"),
            CreateAccountRequest::new("second", "same@example.com"),
        ],
    );
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(pool.list_accounts().unwrap().len(), 1);
}

#[test]
fn provisioned_accounts_need_init() {
    let dir = tempfile::tempdir().unwrap();
    let pool = LocalPool::open(dir.path().join("pool.json")).unwrap();
    provision(
        &pool,
        vec![CreateAccountRequest::new("new", "new@example.com")],
    );

    let mut accounts = Accounts::from_directory(&pool).unwrap();
    accounts.refresh_ctl(&pool);
    assert!(matches!(
        accounts.iter().next().unwrap().err,
        Some(PoolError::NoCtl)
    ));

    accounts.init_ctl(&pool);
    accounts.refresh_ctl(&pool);
    assert_eq!(accounts.errors().count(), 0);
    assert!(accounts.iter().all(|a| a.ctl.is_some()));
}
