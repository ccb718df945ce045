//! Provisioning engine — submit creation requests and poll them to a
//! terminal state.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::error::{PoolError, Result};
use crate::remote::{AccountInfo, CreateAccountRequest, CreateState, Provisioner};

use super::types::*;

// ---------------------------------------------------------------------------
// Create accounts
// ---------------------------------------------------------------------------

/// Create accounts for every request, streaming results as they complete.
///
/// At most [`MAX_CREATE_WORKERS`] requests are in flight at once. Each
/// worker submits a request, then sleeps `poll_interval` between status
/// checks until the request succeeds or fails. The returned receiver yields
/// exactly one [`CreateResult`] per request, in completion order, and
/// disconnects once all workers are done.
///
/// # Errors
///
/// Returns `PoolError::Io` if no worker thread could be started. If only
/// some start, the running ones process every request.
pub fn create_accounts(
    api: Arc<dyn Provisioner>,
    requests: Vec<CreateAccountRequest>,
    poll_interval: Duration,
) -> Result<Receiver<CreateResult>> {
    let (job_tx, job_rx) = channel::unbounded::<CreateAccountRequest>();
    let (result_tx, result_rx) = channel::unbounded();
    let workers = MAX_CREATE_WORKERS.min(requests.len());

    for request in requests {
        // Cannot fail: `job_rx` is alive until the workers take it.
        let _ = job_tx.send(request);
    }
    drop(job_tx);

    let started = start_workers(workers, |n| {
        let api = Arc::clone(&api);
        let jobs = job_rx.clone();
        let results = result_tx.clone();
        std::thread::Builder::new()
            .name(format!("apool-create-{n}"))
            .spawn(move || {
                for request in jobs.iter() {
                    let result = create_one(api.as_ref(), request, poll_interval);
                    if results.send(result).is_err() {
                        log::debug!("create result receiver dropped; worker exiting");
                        break;
                    }
                }
            })
            .map(drop)
    })?;
    log::debug!("{started} create worker(s) running");
    Ok(result_rx)
}

/// Start up to `workers` workers with `spawn`, stopping at the first
/// failure. Workers share one job queue, so any that did start drain it.
///
/// Fails only when workers were wanted and none could be started.
fn start_workers<S>(workers: usize, mut spawn: S) -> Result<usize>
where
    S: FnMut(usize) -> std::io::Result<()>,
{
    for n in 0..workers {
        if let Err(e) = spawn(n) {
            if n == 0 {
                return Err(e.into());
            }
            log::warn!("could not start create worker {n}, continuing with {n}: {e}");
            return Ok(n);
        }
    }
    Ok(workers)
}

fn create_one(
    api: &dyn Provisioner,
    request: CreateAccountRequest,
    poll_interval: Duration,
) -> CreateResult {
    let started_at = crate::time::now_micros();
    let outcome = run_to_completion(api, &request, poll_interval);
    match &outcome {
        Ok(info) => log::debug!("account {} created for {}", info.id, request.email),
        Err(e) => log::warn!("account creation for {} failed: {e}", request.email),
    }
    CreateResult {
        request,
        outcome,
        started_at,
        finished_at: crate::time::now_micros(),
    }
}

/// Drive one request through its provisioning states.
fn run_to_completion(
    api: &dyn Provisioner,
    request: &CreateAccountRequest,
    poll_interval: Duration,
) -> Result<AccountInfo> {
    let mut status = api.create_account(request)?;
    loop {
        let handle = status.handle.clone();
        match status.state {
            CreateState::InProgress => {
                std::thread::sleep(poll_interval);
                status = api.poll_status(&handle)?;
            }
            CreateState::Succeeded { account_id } => return api.describe_account(&account_id),
            CreateState::Failed { reason } => return Err(PoolError::CreateFailed(reason)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
