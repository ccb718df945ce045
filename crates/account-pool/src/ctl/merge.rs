//! Three-way merge of control records.
//!
//! Inputs are the caller's desired record, the record just fetched from the
//! remote field, and the baseline the caller's edits started from. Owner and
//! description follow "no local change adopts remote"; tags replay the
//! caller's delta onto the remote set instead of overwriting it.

use crate::tags;

use super::record::Ctl;

/// Result of merging a local edit with the current remote record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merge {
    /// Ownership was changed concurrently to a third value.
    Conflict,
    /// The merged record equals the remote record; nothing to write.
    Unchanged,
    /// The merged record must be written.
    Write(Ctl),
}

/// Merge `ctl` (local) onto `cur` (remote) using `baseline` as the common
/// ancestor.
pub fn merge(ctl: &Ctl, cur: &Ctl, baseline: &Ctl) -> Merge {
    let owner = if ctl.owner == baseline.owner {
        cur.owner.clone()
    } else if cur.owner != baseline.owner && cur.owner != ctl.owner {
        return Merge::Conflict;
    } else {
        ctl.owner.clone()
    };

    let desc = if ctl.desc == baseline.desc {
        cur.desc.clone()
    } else {
        ctl.desc.clone()
    };

    let (set, clear) = tags::diff(&ctl.tags, &baseline.tags);
    let merged = Ctl {
        owner,
        desc,
        tags: tags::apply(&cur.tags, &set, &clear),
    };

    if &merged == cur {
        Merge::Unchanged
    } else {
        Merge::Write(merged)
    }
}
