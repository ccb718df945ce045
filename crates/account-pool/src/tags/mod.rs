//! Tag algebra — sorted, duplicate-free keyword sets.
//!
//! Tags are always kept in canonical form: trimmed, lowercase, sorted, and
//! free of duplicates. Canonical order makes equality cheap and lets
//! [`diff`] walk two sets in lock-step.
//!
//! Tag sets are never edited by direct insertion. A caller's change is
//! expressed as a `(set, clear)` delta computed by [`diff`] and replayed
//! with [`apply`], which is what allows concurrent edits to disjoint tags
//! to merge cleanly.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result};

/// Keywords that carry meaning in account specs and may never be tags.
pub const RESERVED: [&str; 2] = ["owner", "err"];

/// Characters that would make a tag ambiguous inside an account spec.
const FORBIDDEN_CHARS: [char; 4] = [',', '!', '=', '#'];

/// Canonical tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a comma-separated list of user-supplied tags.
    ///
    /// Every tag is validated with [`validate_tag`]; empty entries are
    /// ignored so `"a,,b"` and `"a,b,"` are accepted.
    pub fn parse_list(list: &str) -> Result<Self> {
        let mut tags = Vec::new();
        for raw in list.split(',') {
            let tag = raw.trim().to_lowercase();
            if tag.is_empty() {
                continue;
            }
            validate_tag(&tag)?;
            tags.push(tag);
        }
        Ok(Self::canonical(tags))
    }

    /// Check whether `tag` is a member (binary search).
    pub fn contains(&self, tag: &str) -> bool {
        self.0
            .binary_search_by(|t| t.as_str().cmp(tag))
            .is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    fn canonical(mut tags: Vec<String>) -> Self {
        tags.sort_unstable();
        tags.dedup();
        Self(tags)
    }
}

impl From<Vec<String>> for Tags {
    /// Normalize arbitrary strings. Used when decoding, so entries that
    /// fail [`validate_tag`] are dropped instead of rejecting the record.
    fn from(tags: Vec<String>) -> Self {
        let tags = tags
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| match validate_tag(t) {
                Ok(()) => true,
                Err(e) => {
                    if !t.is_empty() {
                        log::debug!("dropping tag: {e}");
                    }
                    false
                }
            })
            .collect();
        Self::canonical(tags)
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from(
            iter.into_iter()
                .map(|s| s.as_ref().to_string())
                .collect::<Vec<_>>(),
        )
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// Check that a single tag may be stored in a control record.
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(PoolError::InvalidTag("empty tag".into()));
    }
    if tag != tag.to_lowercase() {
        return Err(PoolError::InvalidTag(format!("{tag:?} is not lowercase")));
    }
    if tag
        .chars()
        .any(|c| c.is_whitespace() || FORBIDDEN_CHARS.contains(&c))
    {
        return Err(PoolError::InvalidTag(format!(
            "{tag:?} contains a reserved character"
        )));
    }
    if RESERVED.contains(&tag) {
        return Err(PoolError::InvalidTag(format!("{tag:?} is a reserved keyword")));
    }
    Ok(())
}

/// Compute the change that turns `baseline` into `target`.
///
/// Returns `(set, clear)`: tags present only in `target` and tags present
/// only in `baseline`. Both inputs are canonical, so a single lock-step
/// walk suffices.
pub fn diff(target: &Tags, baseline: &Tags) -> (Tags, Tags) {
    let (t, b) = (&target.0, &baseline.0);
    let mut set = Vec::new();
    let mut clear = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < t.len() && j < b.len() {
        match t[i].cmp(&b[j]) {
            Ordering::Less => {
                set.push(t[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                clear.push(b[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    set.extend_from_slice(&t[i..]);
    clear.extend_from_slice(&b[j..]);
    (Tags(set), Tags(clear))
}

/// Replay a `(set, clear)` delta onto `tags`.
///
/// Clears are removed first and sets added afterwards, so a tag that is
/// both set and cleared ends up present.
pub fn apply(tags: &Tags, set: &Tags, clear: &Tags) -> Tags {
    let mut members: BTreeSet<&str> = tags.iter().collect();
    for tag in clear.iter() {
        members.remove(tag);
    }
    members.extend(set.iter());
    Tags(members.into_iter().map(str::to_string).collect())
}
