//! AccountPool CLI — `apool` command.
//!
//! Lists, claims, tags, and provisions accounts in a shared pool backed by a
//! local pool file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use account_pool::time::micros_to_rfc3339;
use account_pool::{
    create_accounts, AccountSpec, Accounts, CreateAccountRequest, Ctl, LocalPool, PoolConfig,
    PoolError, Tags,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn apool_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".apool"))
}

fn default_config_path() -> Result<PathBuf> {
    Ok(apool_dir()?.join("config.json"))
}

fn default_state_path() -> Result<PathBuf> {
    Ok(apool_dir()?.join("pool.json"))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// AccountPool CLI — share a pool of cloud accounts between people and jobs.
#[derive(Parser, Debug)]
#[command(
    name = "apool",
    about = "AccountPool CLI",
    version,
    long_about = "apool — AccountPool CLI\n\nSelect accounts with a spec such as `owner=me,!prod` or `123456789012,sandbox`,\nthen claim, release, describe, or tag them."
)]
struct Cli {
    /// Pool state file (default: ~/.apool/pool.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Config file (default: ~/.apool/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Identity used as owner and substituted for `me`
    #[arg(long, global = true)]
    me: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List accounts matching a spec (default: all with a control record)
    List {
        /// Account spec
        spec: Option<String>,
    },

    /// Create control records on accounts that have none
    Init {
        /// Account spec (ids, names, or `err`)
        spec: String,
    },

    /// Add and remove tags
    Tag {
        /// Account spec
        spec: String,

        /// Comma-separated tags to add
        #[arg(long, default_value = "")]
        set: String,

        /// Comma-separated tags to remove
        #[arg(long, default_value = "")]
        clear: String,
    },

    /// Claim unowned accounts
    Own {
        /// Account spec
        spec: String,

        /// Take accounts owned by someone else
        #[arg(long)]
        force: bool,
    },

    /// Give up ownership
    Release {
        /// Account spec
        spec: String,

        /// Release accounts owned by someone else
        #[arg(long)]
        force: bool,
    },

    /// Set the description
    Desc {
        /// Account spec
        spec: String,

        /// New description (empty clears it)
        text: String,
    },

    /// Provision new accounts
    Create {
        /// Accounts to create, as NAME=EMAIL
        #[arg(required = true)]
        accounts: Vec<String>,
    },
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Resolved configuration plus an open pool.
struct Session {
    pool: LocalPool,
    config: PoolConfig,
    me: String,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(p) => p.clone(),
            None => default_config_path()?,
        };
        let config = PoolConfig::load(&config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?;

        let state = match (&cli.state, &config.state_file) {
            (Some(p), _) | (None, Some(p)) => p.clone(),
            (None, None) => default_state_path()?,
        };
        let pool = LocalPool::open(&state)
            .with_context(|| format!("failed to open pool {}", state.display()))?;

        let me = cli.me.clone().unwrap_or_else(|| config.identity_or_user());
        log::debug!("pool {}, identity {me:?}", state.display());
        Ok(Self { pool, config, me })
    }

    /// Load every account with its control record.
    fn accounts(&self) -> Result<Accounts> {
        let mut accounts = Accounts::from_directory(&self.pool)
            .context("failed to list accounts")?
            .with_workers(self.config.workers);
        accounts.refresh_ctl(&self.pool);
        Ok(accounts)
    }

    /// Load every account and keep the ones `spec` selects.
    fn select(&self, spec: &str) -> Result<Accounts> {
        let parsed = AccountSpec::parse(spec, &self.me)?;
        log::debug!(
            "spec {spec:?}: {} token(s), static: {}",
            parsed.tokens().len(),
            parsed.is_static()
        );
        let mut accounts = self.accounts()?;
        parsed.filter(&mut accounts)?;
        accounts.sort();
        Ok(accounts)
    }

    /// Apply `edit` to the working record of every selected account and
    /// save the ones it accepts.
    fn edit<F>(&self, spec: &str, edit: F) -> Result<()>
    where
        F: Fn(&mut Ctl, &str) -> account_pool::Result<()> + Sync,
    {
        let mut accounts = self.select(spec)?;
        if accounts.is_empty() {
            println!("No accounts match {spec:?}");
            return Ok(());
        }
        let me = self.me.as_str();
        let pool = &self.pool;
        accounts.apply(|a| {
            if a.err.is_some() {
                return;
            }
            if let Some(ctl) = a.ctl.as_mut() {
                if let Err(e) = edit(ctl, me) {
                    log::warn!("account {}: {e}", a.id);
                    a.err = Some(e);
                    return;
                }
            }
            a.save_ctl(pool);
        });
        print_accounts(&accounts);
        report_errors(&accounts)
    }
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let result = Session::open(&cli).and_then(|session| match &cli.command {
        Commands::List { spec } => cmd_list(&session, spec.as_deref()),
        Commands::Init { spec } => cmd_init(&session, spec),
        Commands::Tag { spec, set, clear } => cmd_tag(&session, spec, set, clear),
        Commands::Own { spec, force } => cmd_own(&session, spec, *force),
        Commands::Release { spec, force } => cmd_release(&session, spec, *force),
        Commands::Desc { spec, text } => cmd_desc(&session, spec, text),
        Commands::Create { accounts } => cmd_create(&session, accounts),
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `apool list [SPEC]`
fn cmd_list(session: &Session, spec: Option<&str>) -> Result<()> {
    let accounts = session.select(spec.unwrap_or(""))?;
    if accounts.is_empty() {
        println!("No accounts found in {}", session.pool.path().display());
        return Ok(());
    }
    print_accounts(&accounts);
    Ok(())
}

/// `apool init SPEC`
fn cmd_init(session: &Session, spec: &str) -> Result<()> {
    let mut accounts = session.select(spec)?;
    let pending = accounts.iter().filter(|a| a.ctl.is_none()).count();
    if pending == 0 {
        println!("All selected accounts already have a control record");
        return Ok(());
    }
    accounts.init_ctl(&session.pool);
    print_accounts(&accounts);
    report_errors(&accounts)
}

/// `apool tag SPEC [--set a,b] [--clear c]`
fn cmd_tag(session: &Session, spec: &str, set: &str, clear: &str) -> Result<()> {
    let set = Tags::parse_list(set).context("invalid --set")?;
    let clear = Tags::parse_list(clear).context("invalid --clear")?;
    if set.is_empty() && clear.is_empty() {
        bail!("nothing to do: pass --set and/or --clear");
    }
    session.edit(spec, |ctl, _| {
        ctl.update_tags(&set, &clear);
        Ok(())
    })
}

/// `apool own SPEC [--force]`
fn cmd_own(session: &Session, spec: &str, force: bool) -> Result<()> {
    if session.me.is_empty() {
        bail!("no identity: pass --me or set APOOL_IDENTITY");
    }
    session.edit(spec, |ctl, me| {
        if ctl.is_owned() && ctl.owner != me && !force {
            return Err(PoolError::Owned(ctl.owner.clone()));
        }
        ctl.owner = me.to_string();
        Ok(())
    })
}

/// `apool release SPEC [--force]`
fn cmd_release(session: &Session, spec: &str, force: bool) -> Result<()> {
    session.edit(spec, |ctl, me| {
        if ctl.is_owned() && ctl.owner != me && !force {
            return Err(PoolError::Owned(ctl.owner.clone()));
        }
        ctl.owner.clear();
        Ok(())
    })
}

/// `apool desc SPEC TEXT`
fn cmd_desc(session: &Session, spec: &str, text: &str) -> Result<()> {
    session.edit(spec, |ctl, _| {
        ctl.desc = text.to_string();
        Ok(())
    })
}

/// `apool create NAME=EMAIL...`
fn cmd_create(session: &Session, accounts: &[String]) -> Result<()> {
    let requests = accounts
        .iter()
        .map(|arg| parse_create_arg(arg))
        .collect::<Result<Vec<_>>>()?;
    let total = requests.len();

    let rx = create_accounts(
        Arc::new(session.pool.clone()),
        requests,
        session.config.poll_interval(),
    )?;

    let mut failed = 0;
    for result in rx.iter() {
        let finished = micros_to_rfc3339(result.finished_at);
        match &result.outcome {
            Ok(info) => println!(
                "{:<14} {:<24} created {finished} ({:.1}s)",
                info.id.as_str(),
                info.name,
                result.elapsed().as_secs_f64()
            ),
            Err(e) => {
                failed += 1;
                println!("{:<14} {:<24} failed: {e}", "-", result.request.name);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} account(s) could not be created");
    }
    Ok(())
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_accounts(accounts: &Accounts) {
    println!("{:<14} {:<24} {:<12} {:<24} DESCRIPTION", "ID", "NAME", "OWNER", "TAGS");
    println!("{}", "-".repeat(90));
    for a in accounts {
        match (&a.ctl, &a.err) {
            (_, Some(e)) => println!("{:<14} {:<24} ({e})", a.id.as_str(), a.name),
            (Some(ctl), None) => println!(
                "{:<14} {:<24} {:<12} {:<24} {}",
                a.id.as_str(),
                a.name,
                ctl.owner,
                ctl.tags.to_string(),
                ctl.desc
            ),
            (None, None) => println!("{:<14} {:<24} (not loaded)", a.id.as_str(), a.name),
        }
    }
}

fn report_errors(accounts: &Accounts) -> Result<()> {
    let failed = accounts.errors().count();
    if failed > 0 {
        bail!("{failed} account(s) failed");
    }
    Ok(())
}

// ── Parsing helpers ───────────────────────────────────────────────────────────

fn parse_create_arg(arg: &str) -> Result<CreateAccountRequest> {
    let (name, email) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=EMAIL, got {arg:?}"))?;
    let (name, email) = (name.trim(), email.trim());
    if name.is_empty() || !email.contains('@') {
        bail!("expected NAME=EMAIL, got {arg:?}");
    }
    Ok(CreateAccountRequest::new(name, email))
}
