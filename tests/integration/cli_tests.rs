//! Integration tests for the CLI binary.
//!
//! This test is registered as a [[test]] in the account-pool-cli crate so
//! that CARGO_BIN_EXE_apool is available.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use account_pool::LocalPool;

struct Fixture {
    _dir: tempfile::TempDir,
    state: PathBuf,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("pool.json");
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"poll_interval_ms": 5, "workers": 4}"#).unwrap();
        Self {
            _dir: dir,
            state,
            config,
        }
    }

    fn pool(&self) -> LocalPool {
        LocalPool::open(&self.state).unwrap()
    }

    fn run(&self, me: &str, args: &[&str]) -> Output {
        apool(&self.state, &self.config)
            .args(["--me", me])
            .args(args)
            .output()
            .expect("failed to execute apool")
    }
}

/// Get a Command pointing to the `apool` binary with an isolated
/// environment.
fn apool(state: &Path, config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_apool"));
    cmd.env_remove("APOOL_WORKERS")
        .env_remove("APOOL_STATE")
        .env_remove("APOOL_IDENTITY")
        .arg("--state")
        .arg(state)
        .arg("--config")
        .arg(config);
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_responds_to_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_apool"))
        .arg("--help")
        .output()
        .expect("failed to execute apool --help");
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.contains("Usage"), "got: {text}");
    assert!(text.contains("release"), "got: {text}");
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_apool"))
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute apool");
    assert!(!output.status.success());
}

#[test]
fn cli_init_own_tag_release() {
    let fx = Fixture::new();
    let id = fx.pool().add_account("sandbox", "sandbox@example.com").unwrap().id;

    let listed = fx.run("alice", &["list"]);
    assert_success(&listed);
    assert!(stdout(&listed).contains("No accounts"));

    assert_success(&fx.run("alice", &["init", "err"]));
    assert_success(&fx.run("alice", &["own", id.as_str()]));
    assert_success(&fx.run("alice", &["tag", id.as_str(), "--set", "gpu,ci"]));
    assert_success(&fx.run("alice", &["desc", id.as_str(), "perf run"]));

    let mine = fx.run("alice", &["list", "owner=me,gpu"]);
    assert_success(&mine);
    let text = stdout(&mine);
    assert!(text.contains("sandbox"), "got: {text}");
    assert!(text.contains("ci,gpu"), "got: {text}");
    assert!(text.contains("perf run"), "got: {text}");

    // Someone else cannot take it without --force.
    let stolen = fx.run("bob", &["own", id.as_str()]);
    assert!(!stolen.status.success());
    assert!(stdout(&stolen).contains("owned by alice"));

    assert_success(&fx.run("alice", &["release", id.as_str()]));
    let free = fx.run("bob", &["list", "!owner"]);
    assert!(stdout(&free).contains("sandbox"));
}

#[test]
fn cli_rejects_bad_spec() {
    let fx = Fixture::new();
    let output = fx.run("alice", &["list", "gpu=maybe"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "got: {stderr}");
}

#[test]
fn cli_create_accounts() {
    let fx = Fixture::new();
    fx.pool().add_account("old", "taken@example.com").unwrap();

    let ok = fx.run("alice", &["create", "ci-1=ci-1@example.com", "ci-2=ci-2@example.com"]);
    assert_success(&ok);
    assert_eq!(stdout(&ok).matches("created").count(), 2);

    let dup = fx.run("alice", &["create", "again=taken@example.com"]);
    assert!(!dup.status.success());
    assert!(stdout(&dup).contains("EMAIL_ALREADY_EXISTS"));

    let bad = fx.run("alice", &["create", "no-email"]);
    assert!(!bad.status.success());
}
