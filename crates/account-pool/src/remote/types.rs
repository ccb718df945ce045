//! Data exchanged with the directory and provisioning collaborators.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Identity of an account as known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: AccountId,
    pub name: String,
    pub email: String,
}

/// Request to create a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
}

impl CreateAccountRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Opaque token identifying a submitted creation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateHandle(pub String);

impl std::fmt::Display for CreateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provisioning state of a creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CreateState {
    InProgress,
    /// The account exists and has been assigned this id.
    Succeeded { account_id: AccountId },
    /// Terminal failure with the remote side's reason code.
    Failed { reason: String },
}

impl CreateState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Snapshot of a creation request as reported by the provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStatus {
    pub handle: CreateHandle,
    pub state: CreateState,
    /// Submission time (microseconds since epoch).
    pub requested_at: u64,
    /// Time the request reached a terminal state, if it has.
    pub completed_at: Option<u64>,
}
