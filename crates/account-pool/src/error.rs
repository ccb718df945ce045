//! Error types for the account pool.
//!
//! All errors are strongly typed and propagated without panicking.
//! Collaborator failures (network, auth, rate limits) are opaque to the
//! core and surface as [`PoolError::Remote`].

/// Account pool error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("No control record")]
    NoCtl,

    #[error("Control record already exists")]
    CtlExists,

    #[error("Control record update conflict")]
    UpdateConflict,

    #[error("Account is owned by {0}")]
    Owned(String),

    #[error("Unsupported control record version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid control record: {0}")]
    InvalidCtl(String),

    #[error("Control record too large: {len} bytes (max {max})")]
    CtlTooLarge { len: usize, max: usize },

    #[error("Invalid account spec: {0}")]
    InvalidSpec(String),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Account creation failed: {0}")]
    CreateFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PoolError {
    /// Whether the caller should re-fetch state and retry the operation.
    ///
    /// Only update conflicts qualify. Remote failures are reported as-is and
    /// left to the caller's retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpdateConflict)
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, PoolError>;
