//! Accounts — handles, the owning collection, and the bounded executor.
//!
//! The account module provides:
//! - [`Account`] with its working control record and merge baseline
//! - [`Accounts`] with sort/shuffle/filter and bulk refresh/save/init
//! - [`for_each_bounded`], the worker pool shared by every bulk operation

#[allow(clippy::module_inception)]
pub mod account;
pub mod accounts;
pub mod executor;

pub use account::{Account, AccountId};
pub use accounts::Accounts;
pub use executor::{for_each_bounded, DEFAULT_WORKERS};
