//! Reading and writing the control record through a [`ControlClient`].
//!
//! The remote field only supports unconditional reads and overwrites.
//! [`store`] narrows the race window by checking that the value echoed back
//! after the write is byte-for-byte what was sent. A writer that lands
//! between that echo and the next read still goes unnoticed; the check is
//! best effort and must not be mistaken for compare-and-swap.

use crate::error::{PoolError, Result};
use crate::remote::ControlClient;

use super::policy::TrustPolicy;
use super::record::Ctl;

/// Name of the per-account resource whose field holds the control record.
pub const CTL_RESOURCE: &str = "apool-ctl";

/// Create the control resource, denying all use of it, with `ctl` as its
/// initial value.
///
/// # Errors
///
/// Returns `PoolError::CtlExists` if the resource already exists.
pub fn init(client: &dyn ControlClient, ctl: &Ctl) -> Result<()> {
    let encoded = ctl.encode()?;
    client.create_field(CTL_RESOURCE, &TrustPolicy::deny_all(), &encoded)
}

/// Fetch and decode the control record.
///
/// # Errors
///
/// Returns `PoolError::NoCtl` when the resource does not exist, and the
/// decode errors of [`Ctl::decode`] for a corrupt or newer record.
pub fn load(client: &dyn ControlClient) -> Result<Ctl> {
    match client.get_field(CTL_RESOURCE)? {
        Some(value) => Ctl::decode(&value),
        None => Err(PoolError::NoCtl),
    }
}

/// Overwrite the control record and verify the echo.
///
/// # Errors
///
/// Returns `PoolError::UpdateConflict` if the remote reports a different
/// value than the one written.
pub fn store(client: &dyn ControlClient, ctl: &Ctl) -> Result<()> {
    let encoded = ctl.encode()?;
    let echoed = client.set_field(CTL_RESOURCE, &encoded)?;
    if echoed != encoded {
        log::warn!("control record changed during store");
        return Err(PoolError::UpdateConflict);
    }
    Ok(())
}
