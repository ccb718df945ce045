//! The account collection and its bulk operations.
//!
//! Every bulk operation goes through [`Accounts::apply`], which runs one
//! closure per account on the bounded executor. Failures land on the
//! individual [`Account::err`]; siblings are unaffected.

use rand::seq::SliceRandom;

use crate::ctl::Ctl;
use crate::error::{PoolError, Result};
use crate::remote::{CredentialProvider, Directory};

use super::account::{Account, AccountId};
use super::executor::{for_each_bounded, DEFAULT_WORKERS};

/// Caller-owned set of accounts.
#[derive(Debug)]
pub struct Accounts {
    list: Vec<Account>,
    workers: usize,
}

impl Accounts {
    pub fn new(list: Vec<Account>) -> Self {
        Self {
            list,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Populate the collection from a directory listing.
    pub fn from_directory(directory: &dyn Directory) -> Result<Self> {
        let infos = directory.list_accounts()?;
        Ok(infos.into_iter().map(Account::from).collect())
    }

    /// Override the number of concurrent workers used by bulk operations.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Account> {
        self.list.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Account> {
        self.list.iter_mut()
    }

    pub fn as_slice(&self) -> &[Account] {
        &self.list
    }

    pub fn find(&self, id: &AccountId) -> Option<&Account> {
        self.list.iter().find(|a| &a.id == id)
    }

    pub fn find_mut(&mut self, id: &AccountId) -> Option<&mut Account> {
        self.list.iter_mut().find(|a| &a.id == id)
    }

    /// Accounts whose last operation failed.
    pub fn errors(&self) -> impl Iterator<Item = (&Account, &PoolError)> {
        self.list
            .iter()
            .filter_map(|a| a.err.as_ref().map(|e| (a, e)))
    }

    /// Keep only the accounts matching `keep`, preserving order.
    ///
    /// Works in place on the existing allocation: nothing moves when the
    /// survivors already form a prefix, otherwise they are compacted.
    pub fn filter(&mut self, mut keep: impl FnMut(&Account) -> bool) {
        self.list.retain(|a| keep(a));
    }

    /// Order by name, then id.
    pub fn sort(&mut self) {
        self.list
            .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    }

    /// Uniform random permutation in place.
    pub fn shuffle(&mut self) {
        self.list.shuffle(&mut rand::thread_rng());
    }

    /// Run `f` on every account with bounded concurrency.
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(&mut Account) + Sync,
    {
        for_each_bounded(&mut self.list, self.workers, f);
    }

    /// Reload the control record of every account.
    pub fn refresh_ctl(&mut self, creds: &dyn CredentialProvider) {
        self.apply(|a| a.load_ctl(creds));
    }

    /// Load control records for accounts that have neither a record nor an
    /// error yet.
    pub fn require_ctl(&mut self, creds: &dyn CredentialProvider) {
        self.apply(|a| {
            if a.ctl.is_none() && a.err.is_none() {
                a.load_ctl(creds);
            }
        });
    }

    /// Merge and store every account's working control record.
    pub fn save_ctl(&mut self, creds: &dyn CredentialProvider) {
        self.apply(|a| a.save_ctl(creds));
    }

    /// Create empty control records for accounts reporting `NoCtl`.
    pub fn init_ctl(&mut self, creds: &dyn CredentialProvider) {
        let initial = Ctl::default();
        self.apply(|a| {
            if a.ctl.is_none() && matches!(a.err, Some(PoolError::NoCtl)) {
                a.init_ctl(creds, &initial);
            }
        });
    }
}

impl Default for Accounts {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FromIterator<Account> for Accounts {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Accounts {
    type Item = &'a Account;
    type IntoIter = std::slice::Iter<'a, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

impl IntoIterator for Accounts {
    type Item = Account;
    type IntoIter = std::vec::IntoIter<Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}
