//! Control records — the persisted owner/description/tags of an account.
//!
//! The ctl module provides:
//! - The [`Ctl`] record and its versioned base64 encoding
//! - The deny-all [`TrustPolicy`] attached to the control resource
//! - Remote [`init`], [`load`], and verified [`store`]
//! - The three-way [`merge`] used to reconcile concurrent edits

pub mod merge;
pub mod persist;
pub mod policy;
pub mod record;

pub use merge::{merge, Merge};
pub use persist::{init, load, store, CTL_RESOURCE};
pub use policy::{Effect, PolicyStatement, Principal, TrustPolicy};
pub use record::{Ctl, CTL_VERSION, MAX_ENCODED_LEN};
