//! AccountPool — control plane for a shared pool of cloud accounts.
//!
//! Each account carries a small control record (owner, description, tags)
//! stored in a remote field on the account itself. This crate reads and
//! writes those records with optimistic three-way merging, selects accounts
//! with a compact spec language, runs bulk operations over a bounded worker
//! pool, and provisions new accounts.

pub mod account;
pub mod config;
pub mod ctl;
pub mod error;
pub mod provision;
pub mod query;
pub mod remote;
pub mod storage;
pub mod tags;
pub mod time;

// Re-export primary types
pub use account::{Account, AccountId, Accounts};
pub use config::PoolConfig;
pub use ctl::{Ctl, Merge, TrustPolicy};
pub use error::{PoolError, Result};
pub use query::AccountSpec;
pub use tags::Tags;

// Re-export collaborator seams
pub use remote::{
    AccountInfo, ControlClient, CreateAccountRequest, CreateHandle, CreateState, CreateStatus,
    CredentialProvider, Directory, Provisioner,
};
pub use storage::LocalPool;

// Re-export provisioning
pub use provision::{create_accounts, CreateResult};
