//! Data structures for account provisioning.

use std::time::Duration;

use crate::error::Result;
use crate::remote::{AccountInfo, CreateAccountRequest};

/// Upper bound on concurrent creation requests. The remote side rate
/// limits account creation, so this does not scale with the input.
pub const MAX_CREATE_WORKERS: usize = 5;

/// Default delay between status checks of an in-progress request.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Outcome of one creation request, streamed as soon as it is known.
#[derive(Debug)]
pub struct CreateResult {
    pub request: CreateAccountRequest,
    /// Details of the new account, or why it could not be created.
    pub outcome: Result<AccountInfo>,
    /// Time the worker picked up the request (microseconds since epoch).
    pub started_at: u64,
    /// Time the request reached a terminal state.
    pub finished_at: u64,
}

impl CreateResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Wall-clock time spent on the request.
    pub fn elapsed(&self) -> Duration {
        crate::time::micros_between(self.started_at, self.finished_at)
    }
}
