//! Seams to the systems the control plane runs against.
//!
//! The core never talks to a cloud SDK directly. Everything remote goes
//! through four traits:
//!
//! - [`CredentialProvider`]: hands out a usable [`ControlClient`] for an
//!   account; caching and renewal of credentials live behind it.
//! - [`ControlClient`]: unconditional get/set of a named text field on a
//!   per-account resource, plus create-with-policy.
//! - [`Directory`]: lists the initial account population.
//! - [`Provisioner`]: submits account creation and reports its progress.
//!
//! [`crate::storage::LocalPool`] implements all four on top of a JSON file.

pub mod types;

use std::sync::Arc;

use crate::account::AccountId;
use crate::ctl::TrustPolicy;
use crate::error::Result;

pub use types::{AccountInfo, CreateAccountRequest, CreateHandle, CreateState, CreateStatus};

/// Per-account administrative API, already authorized.
///
/// None of these calls are conditional. There is no compare-and-swap.
pub trait ControlClient: Send + Sync {
    /// Read the field stored on `resource`. `Ok(None)` when the resource
    /// does not exist.
    fn get_field(&self, resource: &str) -> Result<Option<String>>;

    /// Overwrite the field on `resource` and return the value the remote
    /// side reports after the write.
    fn set_field(&self, resource: &str, value: &str) -> Result<String>;

    /// Create `resource` with the given trust policy and initial field
    /// value. Fails with [`crate::PoolError::CtlExists`] if it already
    /// exists.
    fn create_field(&self, resource: &str, policy: &TrustPolicy, value: &str) -> Result<()>;
}

/// Source of authorized clients, one per account.
pub trait CredentialProvider: Send + Sync {
    fn control_client(&self, account: &AccountId) -> Result<Arc<dyn ControlClient>>;
}

/// Account listing.
pub trait Directory {
    fn list_accounts(&self) -> Result<Vec<AccountInfo>>;
}

/// Asynchronous account creation.
pub trait Provisioner: Send + Sync {
    /// Submit a creation request. The returned status is usually
    /// [`CreateState::InProgress`].
    fn create_account(&self, request: &CreateAccountRequest) -> Result<CreateStatus>;

    /// Check on a previously submitted request.
    fn poll_status(&self, handle: &CreateHandle) -> Result<CreateStatus>;

    /// Fetch full details of an existing account.
    fn describe_account(&self, id: &AccountId) -> Result<AccountInfo>;
}
