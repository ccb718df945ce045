//! Stress test: concurrent saves against one pool file.
//!
//! Every account lives in the same JSON document, so each save rewrites the
//! whole file. Writers touching different accounts must never drop each
//! other's records.

use std::sync::Arc;
use std::thread;

use account_pool::{AccountSpec, Accounts, LocalPool, Tags};

const THREADS: usize = 8;
const PER_THREAD: usize = 5;

fn seeded_pool(dir: &tempfile::TempDir, count: usize) -> LocalPool {
    let pool = LocalPool::open(dir.path().join("pool.json")).unwrap();
    for i in 0..count {
        pool.add_account(&format!("acct-{i}"), &format!("{i}@example.com"))
            .unwrap();
    }
    let mut accounts = Accounts::from_directory(&pool).unwrap();
    accounts.refresh_ctl(&pool);
    accounts.init_ctl(&pool);
    assert_eq!(accounts.errors().count(), 0);
    pool
}

fn load_all(pool: &LocalPool) -> Accounts {
    let mut accounts = Accounts::from_directory(pool).unwrap();
    accounts.refresh_ctl(pool);
    accounts.sort();
    accounts
}

#[test]
fn stress_sessions_on_disjoint_accounts() {
    let dir = tempfile::tempdir().unwrap();
    let pool = Arc::new(seeded_pool(&dir, THREADS * PER_THREAD));
    let ids: Vec<String> = load_all(&pool).iter().map(|a| a.id.to_string()).collect();

    let handles: Vec<_> = ids
        .chunks(PER_THREAD)
        .enumerate()
        .map(|(t, chunk)| {
            let pool = Arc::clone(&pool);
            let spec = chunk.join(",");
            thread::spawn(move || {
                let me = format!("worker-{t}");
                let mut accounts = load_all(&pool);
                AccountSpec::parse(&spec, &me)
                    .unwrap()
                    .filter(&mut accounts)
                    .unwrap();
                assert_eq!(accounts.len(), PER_THREAD);

                let tag = Tags::parse_list(&me).unwrap();
                for a in accounts.iter_mut() {
                    let ctl = a.ctl.as_mut().unwrap();
                    ctl.owner = me.clone();
                    ctl.update_tags(&tag, &Tags::new());
                }
                accounts.save_ctl(pool.as_ref());
                assert_eq!(accounts.errors().count(), 0);
            })
        })
        .collect();

    for h in handles {
        h.join().expect("worker thread panicked");
    }

    for t in 0..THREADS {
        let me = format!("worker-{t}");
        let mut accounts = load_all(&pool);
        AccountSpec::parse(&format!("owner=me,{me}"), &me)
            .unwrap()
            .filter(&mut accounts)
            .unwrap();
        assert_eq!(accounts.len(), PER_THREAD, "{me} lost records");
    }
}

#[test]
fn stress_bulk_save_with_many_workers() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir, 120);

    let mut accounts = load_all(&pool).with_workers(16);
    let gpu = Tags::parse_list("gpu").unwrap();
    accounts.apply(|a| {
        let ctl = a.ctl.as_mut().unwrap();
        ctl.desc = format!("desc for {}", a.name);
        ctl.update_tags(&gpu, &Tags::new());
    });
    accounts.save_ctl(&pool);
    assert_eq!(accounts.errors().count(), 0);

    let reloaded = load_all(&pool);
    assert_eq!(reloaded.len(), 120);
    for a in &reloaded {
        let ctl = a.ctl.as_ref().unwrap();
        assert_eq!(ctl.desc, format!("desc for {}", a.name));
        assert!(ctl.tags.contains("gpu"));
    }
}

#[test]
fn stress_bulk_refresh_many_accounts() {
    let dir = tempfile::tempdir().unwrap();
    let pool = LocalPool::open(dir.path().join("pool.json")).unwrap();
    for i in 0..200 {
        pool.add_account(&format!("bulk-{i}"), &format!("bulk-{i}@example.com"))
            .unwrap();
    }

    let mut accounts = Accounts::from_directory(&pool).unwrap().with_workers(16);
    accounts.refresh_ctl(&pool);
    assert_eq!(accounts.errors().count(), 200);
    accounts.init_ctl(&pool);
    accounts.refresh_ctl(&pool);
    assert_eq!(accounts.errors().count(), 0);
    assert!(accounts.iter().all(|a| a.ctl.is_some()));
}
