//! Storage layer.
//!
//! The storage module provides:
//! - [`local_pool`]: a file-backed pool implementing the directory,
//!   credential, control-field, and provisioning collaborators
//!
//! # Default location
//!
//! ```text
//! ~/.apool/
//! ├── config.json
//! └── pool.json
//! ```

pub mod local_pool;

pub use local_pool::{LocalPool, EMAIL_ALREADY_EXISTS};
