//! Account handles — identity plus control-record bookkeeping.
//!
//! An [`Account`] carries two records:
//!
//! - `ctl`: the caller's working copy, `None` until loaded;
//! - `baseline`: the last record read from (or written to) the remote
//!   field. It is the merge base and is never edited by callers.
//!
//! Remote failures are attached to `err` instead of being returned, so a
//! bulk operation over many accounts never stops at the first failure.

use serde::{Deserialize, Serialize};

use crate::ctl::{self, Ctl, Merge};
use crate::error::{PoolError, Result};
use crate::remote::{AccountInfo, CredentialProvider};

/// Cloud account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Whether `s` has the shape of an account id (all ASCII digits).
    pub fn looks_like_id(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One account in the pool.
#[derive(Debug)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Working copy of the control record.
    pub ctl: Option<Ctl>,
    /// Error from the most recent remote operation.
    pub err: Option<PoolError>,
    baseline: Ctl,
}

impl Account {
    /// Create a handle with identity only.
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ctl: None,
            err: None,
            baseline: Ctl::default(),
        }
    }

    /// Attach an already-known control record as both working copy and
    /// baseline.
    pub fn with_ctl(mut self, ctl: Ctl) -> Self {
        self.baseline = ctl.clone();
        self.ctl = Some(ctl);
        self
    }

    /// Last record known to be stored remotely.
    pub fn baseline(&self) -> &Ctl {
        &self.baseline
    }

    /// Fetch the control record, replacing both working copy and baseline.
    pub fn load_ctl(&mut self, creds: &dyn CredentialProvider) {
        let loaded = creds
            .control_client(&self.id)
            .and_then(|client| ctl::load(client.as_ref()));
        match loaded {
            Ok(ctl) => {
                self.baseline = ctl.clone();
                self.ctl = Some(ctl);
                self.err = None;
            }
            Err(e) => {
                log::debug!("account {}: load failed: {e}", self.id);
                self.ctl = None;
                self.baseline = Ctl::default();
                self.err = Some(e);
            }
        }
    }

    /// Create the remote control record with `initial` as its value.
    ///
    /// An existing record is left alone and reported as `CtlExists`.
    pub fn init_ctl(&mut self, creds: &dyn CredentialProvider, initial: &Ctl) {
        let created = creds
            .control_client(&self.id)
            .and_then(|client| ctl::init(client.as_ref(), initial));
        match created {
            Ok(()) => {
                log::debug!("account {}: control record created", self.id);
                self.baseline = initial.clone();
                self.ctl = Some(initial.clone());
                self.err = None;
            }
            Err(e) => self.err = Some(e),
        }
    }

    /// Merge the working copy into the remote record and write the result.
    ///
    /// An account without a working copy is marked `NoCtl` unless it already
    /// carries an error. Conflicts leave the working copy untouched and
    /// report `UpdateConflict`; the caller should refresh and redo its edit.
    pub fn save_ctl(&mut self, creds: &dyn CredentialProvider) {
        if self.ctl.is_none() {
            if self.err.is_none() {
                self.err = Some(PoolError::NoCtl);
            }
            return;
        }
        self.err = self.try_save(creds).err();
    }

    fn try_save(&mut self, creds: &dyn CredentialProvider) -> Result<()> {
        let client = creds.control_client(&self.id)?;
        let cur = ctl::load(client.as_ref())?;
        let local = self.ctl.as_ref().ok_or(PoolError::NoCtl)?;

        match ctl::merge(local, &cur, &self.baseline) {
            Merge::Conflict => {
                log::warn!(
                    "account {}: owner changed concurrently to {:?}",
                    self.id,
                    cur.owner
                );
                self.baseline = cur;
                Err(PoolError::UpdateConflict)
            }
            Merge::Unchanged => {
                self.ctl = Some(cur.clone());
                self.baseline = cur;
                Ok(())
            }
            Merge::Write(merged) => {
                ctl::store(client.as_ref(), &merged)?;
                log::debug!("account {}: control record saved", self.id);
                self.ctl = Some(merged.clone());
                self.baseline = merged;
                Ok(())
            }
        }
    }
}

impl From<AccountInfo> for Account {
    fn from(info: AccountInfo) -> Self {
        Self::new(info.id, info.name)
    }
}
