//! Account spec parsing.
//!
//! Grammar, one entry per comma-separated item:
//!
//! ```text
//! entry := "!"* name [ "=" value ]
//!        | "!"* name "!=" value
//! ```
//!
//! An odd number of leading `!` negates the entry, and `!=` negates it once
//! more. A boolean value (`true`, `no`, `0`, ...) is not kept: a false
//! value flips the negation. Names are case-insensitive.
//!
//! Two names are reserved:
//!
//! - `err` includes accounts whose control record could not be loaded.
//! - `owner` constrains ownership: `owner` (has an owner), `!owner` (has
//!   none), `owner=X`, `owner!=X`, with `me` standing for the caller.
//!
//! Every other entry is a token. Tokens are tags, unless one of them looks
//! like an account id or there are more entries than fit in the 64-bit tag
//! mask, in which case all tokens are matched against account ids and names.

use std::collections::{BTreeMap, HashMap};

use crate::account::AccountId;
use crate::error::{PoolError, Result};

/// Width of the tag mask; entry positions beyond it force static matching.
pub const MAX_TAG_TOKENS: usize = u64::BITS as usize;

/// Owner keyword resolved to the caller's identity.
const ME: &str = "me";

/// A non-reserved entry of the spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased tag, account id, or account name.
    pub name: String,
    pub negated: bool,
    /// Position of the entry in the comma-separated list.
    pub pos: usize,
}

/// Parsed, immutable account selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSpec {
    pub(super) tokens: Vec<Token>,
    /// Owner value → whether the account's owner must equal it.
    pub(super) owners: BTreeMap<String, bool>,
    /// Set when an owner clause can never be satisfied.
    pub(super) owner_never: bool,
    pub(super) include_err: bool,
    pub(super) is_static: bool,
    /// Tag name → mask of the entry positions it occupies.
    pub(super) bits: HashMap<String, u64>,
    /// Required mask: positions of non-negated tag tokens.
    pub(super) target: u64,
}

impl AccountSpec {
    /// Parse `spec`, resolving `owner=me` to `me`.
    ///
    /// An empty `me` makes any `me` owner clause unsatisfiable.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidSpec` for an entry without a name or a
    /// non-boolean value on anything other than `owner`.
    pub fn parse(spec: &str, me: &str) -> Result<Self> {
        let entries: Vec<&str> = if spec.trim().is_empty() {
            Vec::new()
        } else {
            spec.split(',').collect()
        };

        let mut out = Self {
            tokens: Vec::new(),
            owners: BTreeMap::new(),
            owner_never: false,
            include_err: false,
            is_static: entries.len() > MAX_TAG_TOKENS,
            bits: HashMap::new(),
            target: 0,
        };

        for (pos, raw) in entries.iter().enumerate() {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }
            let (name, negated, value) = split_entry(entry)?;
            match name.as_str() {
                "err" => {
                    if let Some(v) = value {
                        return Err(PoolError::InvalidSpec(format!("err={v}")));
                    }
                    out.include_err = !negated;
                }
                "owner" => out.add_owner(negated, value, me),
                _ => {
                    if let Some(v) = value {
                        return Err(PoolError::InvalidSpec(format!(
                            "{entry:?}: only owner takes a value, got {v:?}"
                        )));
                    }
                    out.tokens.push(Token { name, negated, pos });
                }
            }
        }

        out.is_static |= out
            .tokens
            .iter()
            .any(|t| AccountId::looks_like_id(&t.name));

        if !out.is_static {
            for t in &out.tokens {
                let bit = 1u64 << t.pos;
                *out.bits.entry(t.name.clone()).or_default() |= bit;
                if !t.negated {
                    out.target |= bit;
                }
            }
        }
        Ok(out)
    }

    fn add_owner(&mut self, negated: bool, value: Option<String>, me: &str) {
        let (owner, must_equal) = match value {
            // Bare `owner` means "owner is not empty".
            None => (String::new(), negated),
            Some(v) if v.eq_ignore_ascii_case(ME) => {
                if me.is_empty() {
                    self.owner_never = true;
                    return;
                }
                (me.to_string(), !negated)
            }
            Some(v) => (v, !negated),
        };
        if let Some(prev) = self.owners.insert(owner, must_equal) {
            if prev != must_equal {
                self.owner_never = true;
            }
        }
    }

    /// True when accounts are selected by id/name rather than by tags.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// True when accounts without a control record are kept.
    pub fn includes_err(&self) -> bool {
        self.include_err
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Split one entry into lowercased name, negation, and optional
/// non-boolean value.
fn split_entry(entry: &str) -> Result<(String, bool, Option<String>)> {
    let rest = entry.trim_start_matches('!');
    let mut negated = (entry.len() - rest.len()) % 2 == 1;

    let (name, value) = if let Some((n, v)) = rest.split_once("!=") {
        negated = !negated;
        (n, Some(v.trim()))
    } else if let Some((n, v)) = rest.split_once('=') {
        (n, Some(v.trim()))
    } else {
        (rest, None)
    };

    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(PoolError::InvalidSpec(format!("{entry:?}: missing name")));
    }

    let value = match value.map(|v| (v, parse_bool(v))) {
        Some((_, Some(b))) => {
            if !b {
                negated = !negated;
            }
            None
        }
        Some((v, None)) => Some(v.to_string()),
        None => None,
    };
    Ok((name, negated, value))
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" => Some(true),
        "0" | "f" | "false" | "n" | "no" => Some(false),
        _ => None,
    }
}
