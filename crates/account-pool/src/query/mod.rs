//! Account selection.
//!
//! An [`AccountSpec`] is parsed once per query from a user-facing selector
//! such as `owner=me,!staging,err` and then applied to an
//! [`crate::Accounts`] collection with [`AccountSpec::filter`].
//!
//! ## Evaluation model
//!
//! - **Static**: tokens name accounts by id or name. Triggered by any
//!   id-shaped token or by more entries than the tag mask can hold.
//! - **Dynamic**: owner clauses plus an exact comparison of tag masks.
//!   Accounts whose control record is not loaded are dropped unless the
//!   spec includes `err`.

pub mod filter;
pub mod spec;

pub use spec::{AccountSpec, Token, MAX_TAG_TOKENS};
