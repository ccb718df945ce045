//! Account provisioning — creating new accounts through a rate-limited
//! remote API.
//!
//! The provision module provides:
//! - A small fixed worker pool fed from a request queue
//! - Per-request submit-then-poll state handling
//! - Results streamed over a channel as each request completes

pub mod engine;
pub mod types;

pub use engine::create_accounts;
pub use types::{CreateResult, DEFAULT_POLL_INTERVAL, MAX_CREATE_WORKERS};
