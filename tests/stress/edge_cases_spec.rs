//! Edge cases: tag algebra, control record limits, spec parsing and
//! filtering corner cases.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use account_pool::ctl::{merge, MAX_ENCODED_LEN};
use account_pool::tags::{apply, diff};
use account_pool::{Account, AccountId, AccountSpec, Accounts, Ctl, Merge, PoolError, Tags};

fn account(id: &str, owner: &str, tags: &str) -> Account {
    Account::new(AccountId::new(id), format!("acct-{id}"))
        .with_ctl(Ctl::new(owner, "", Tags::parse_list(tags).unwrap()))
}

fn selected(spec: &str, me: &str, accounts: Vec<Account>) -> Result<Vec<String>, PoolError> {
    let mut accounts: Accounts = accounts.into_iter().collect();
    AccountSpec::parse(spec, me)?.filter(&mut accounts)?;
    Ok(accounts.iter().map(|a| a.id.to_string()).collect())
}

// ── Tag algebra ──────────────────────────────────────────────────────────────

#[test]
fn edge_diff_apply_randomized() {
    let universe: Vec<String> = (0..24).map(|i| format!("t{i}")).collect();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..500 {
        let mut pick = || -> Tags {
            let n = rng.gen_range(0..universe.len());
            universe.choose_multiple(&mut rng, n).collect()
        };
        let (a, b) = (pick(), pick());
        let (set, clear) = diff(&a, &b);
        assert_eq!(apply(&b, &set, &clear), a, "a={a} b={b}");
        assert!(set.iter().all(|t| !clear.contains(t)));
    }
}

#[test]
fn edge_tags_normalize_and_validate() {
    let t = Tags::parse_list(" B ,a,, b ,A").unwrap();
    assert_eq!(t.to_string(), "a,b");

    for bad in ["owner", "err", "a=b", "x!", "has space", "c#d"] {
        assert!(
            matches!(Tags::parse_list(bad), Err(PoolError::InvalidTag(_))),
            "{bad:?} should be rejected"
        );
    }
}

// ── Control record ───────────────────────────────────────────────────────────

#[test]
fn edge_ctl_size_limit() {
    let small = Ctl::new("alice", "x".repeat(100), Tags::new());
    assert!(small.encode().unwrap().len() <= MAX_ENCODED_LEN);

    let big = Ctl::new("alice", "x".repeat(MAX_ENCODED_LEN), Tags::new());
    assert!(matches!(
        big.encode(),
        Err(PoolError::CtlTooLarge { max, .. }) if max == MAX_ENCODED_LEN
    ));
}

#[test]
fn edge_ctl_decode_failures() {
    use base64::Engine;
    let b64 = |s: &str| base64::engine::general_purpose::STANDARD.encode(s);

    assert!(matches!(
        Ctl::decode("%%% not base64"),
        Err(PoolError::InvalidCtl(_))
    ));
    assert!(matches!(
        Ctl::decode(&b64("2#{}")),
        Err(PoolError::UnsupportedVersion(v)) if v == "2"
    ));
    assert!(matches!(
        Ctl::decode(&b64("no separator")),
        Err(PoolError::InvalidCtl(_))
    ));
    assert!(matches!(
        Ctl::decode(&b64("1#[1,2]")),
        Err(PoolError::InvalidCtl(_))
    ));
    assert_eq!(Ctl::decode(&b64("1#{}")).unwrap(), Ctl::default());
}

#[test]
fn edge_merge_identity_is_unchanged() {
    let c = Ctl::new("bob", "desc", Tags::parse_list("x,y").unwrap());
    assert_eq!(merge(&c, &c, &c), Merge::Unchanged);
}

// ── Spec parsing ─────────────────────────────────────────────────────────────

#[test]
fn edge_spec_rejects_values_on_tags() {
    assert!(matches!(
        AccountSpec::parse("gpu=maybe", "me"),
        Err(PoolError::InvalidSpec(_))
    ));
    assert!(AccountSpec::parse("gpu=true,ci=no", "me").is_ok());
}

#[test]
fn edge_spec_blank_entries_ignored() {
    let accts = || vec![account("1", "", "a"), account("2", "", "b")];
    assert_eq!(selected(" , a ,, ", "", accts()).unwrap(), ["1"]);
    assert_eq!(selected("", "", accts()).unwrap(), ["1", "2"]);
}

#[test]
fn edge_spec_negation_parity() {
    let accts = || vec![account("1", "", "a"), account("2", "", "b")];
    assert_eq!(selected("!!a", "", accts()).unwrap(), ["1"]);
    assert_eq!(selected("!a", "", accts()).unwrap(), ["2"]);
    assert_eq!(selected("a=false", "", accts()).unwrap(), ["2"]);
    assert_eq!(selected("!a=no", "", accts()).unwrap(), ["1"]);
}

#[test]
fn edge_spec_positive_and_negative_tags() {
    let accts = || {
        vec![
            account("1", "", "a"),
            account("2", "", "a,b"),
            account("3", "", "a,c"),
        ]
    };
    let picked = selected("a,!b", "", accts()).unwrap();
    assert!(!picked.contains(&"2".to_string()));
    assert_eq!(picked, ["1", "3"]);
}

#[test]
fn edge_spec_too_many_entries_goes_static() {
    let spec: Vec<String> = (0..=64).map(|i| format!("tag{i}")).collect();
    let parsed = AccountSpec::parse(&spec.join(","), "").unwrap();
    assert!(parsed.is_static());

    // Tags are now matched as names; none exist.
    let err = selected(&spec.join(","), "", vec![account("1", "", "tag0")]).unwrap_err();
    assert!(matches!(err, PoolError::NotFound(name) if name == "tag0"));
}

#[test]
fn edge_spec_sixty_four_entries_stay_dynamic() {
    let spec: Vec<String> = (0..64).map(|i| format!("!tag{i}")).collect();
    let parsed = AccountSpec::parse(&spec.join(","), "").unwrap();
    assert!(!parsed.is_static());
    assert_eq!(
        selected(&spec.join(","), "", vec![account("1", "", "tag63"), account("2", "", "")])
            .unwrap(),
        ["2"]
    );
}

#[test]
fn edge_static_negated_only_keeps_rest() {
    let accts = || vec![account("11", "", ""), account("22", "", ""), account("33", "", "")];
    assert_eq!(selected("!22", "", accts()).unwrap(), ["11", "33"]);
    assert_eq!(selected("!99", "", accts()).unwrap(), ["11", "22", "33"]);
}

#[test]
fn edge_owner_clauses() {
    let accts = || vec![account("1", "", ""), account("2", "a", ""), account("3", "b", "")];
    assert_eq!(selected("owner=a", "a", accts()).unwrap(), ["2"]);
    assert_eq!(selected("owner=me", "a", accts()).unwrap(), ["2"]);
    assert_eq!(selected("!owner", "a", accts()).unwrap(), ["1"]);
    // Contradictory clauses select nothing.
    assert!(selected("owner=a,owner!=a", "", accts()).unwrap().is_empty());
    // `me` without an identity selects nothing.
    assert!(selected("owner=me", "", accts()).unwrap().is_empty());
}

#[test]
fn edge_shuffle_keeps_members() {
    let mut accounts: Accounts = (0..50).map(|i| account(&i.to_string(), "", "")).collect();
    accounts.shuffle();
    accounts.sort();
    let ids: Vec<String> = accounts.iter().map(|a| a.id.to_string()).collect();
    let mut expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
    expected.sort_by(|a, b| format!("acct-{a}").cmp(&format!("acct-{b}")));
    assert_eq!(ids, expected);
}
