//! Account spec evaluation.
//!
//! Static specs select accounts by id or name; every non-negated token must
//! resolve to exactly one candidate. Dynamic specs select by owner and tags:
//! the account's tags are folded into a mask over the spec's token
//! positions and compared for equality with the target mask, so an account
//! must carry every required tag and none of the negated ones. Tags the
//! spec does not mention do not affect the result.

use crate::account::{Account, Accounts};
use crate::error::{PoolError, Result};

use super::spec::{AccountSpec, Token};

impl AccountSpec {
    /// Narrow `accounts` in place to those selected by this spec.
    ///
    /// # Errors
    ///
    /// For static specs, returns `PoolError::NotFound` when a non-negated
    /// token matches no account or more than one. `accounts` is left
    /// untouched on error.
    pub fn filter(&self, accounts: &mut Accounts) -> Result<()> {
        if self.is_static {
            return self.filter_static(accounts);
        }
        accounts.filter(|a| self.matches(a));
        Ok(())
    }

    /// Evaluate the owner and tag clauses against one account.
    ///
    /// Accounts without a control record match only when the spec includes
    /// `err`.
    pub fn matches(&self, account: &Account) -> bool {
        let Some(ctl) = &account.ctl else {
            return self.include_err;
        };
        if self.owner_never {
            return false;
        }
        if self
            .owners
            .iter()
            .any(|(owner, &must_equal)| (&ctl.owner == owner) != must_equal)
        {
            return false;
        }
        let mask = ctl
            .tags
            .iter()
            .fold(0u64, |m, tag| m | self.bits.get(tag).copied().unwrap_or(0));
        mask == self.target
    }

    fn filter_static(&self, accounts: &mut Accounts) -> Result<()> {
        let n = accounts.len();
        let mut selected = vec![false; n];
        let mut excluded = vec![false; n];
        let mut any_positive = false;

        for token in &self.tokens {
            let hits: Vec<usize> = accounts
                .iter()
                .enumerate()
                .filter(|(_, a)| identifies(token, a))
                .map(|(i, _)| i)
                .collect();

            if token.negated {
                for i in hits {
                    excluded[i] = true;
                }
                continue;
            }
            any_positive = true;
            match hits.as_slice() {
                [i] => selected[*i] = true,
                [] => return Err(PoolError::NotFound(token.name.clone())),
                many => {
                    return Err(PoolError::NotFound(format!(
                        "{} is ambiguous ({} matches)",
                        token.name,
                        many.len()
                    )))
                }
            }
        }

        let mut i = 0;
        accounts.filter(|_| {
            let keep = (!any_positive || selected[i]) && !excluded[i];
            i += 1;
            keep
        });
        Ok(())
    }
}

fn identifies(token: &Token, account: &Account) -> bool {
    account.id.as_str() == token.name || account.name.eq_ignore_ascii_case(&token.name)
}
