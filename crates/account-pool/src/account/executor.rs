//! Bounded concurrent execution over a slice.
//!
//! Per-account work is dominated by network round trips, so a small fixed
//! number of threads is enough and keeps the remote API from being flooded.
//! Workers pull items from a shared queue; the call returns only after every
//! item has been processed.

use std::sync::{Mutex, PoisonError};

/// Default number of concurrent workers for bulk account operations.
pub const DEFAULT_WORKERS: usize = 8;

/// Run `f` on every element of `items` with at most `workers` concurrent
/// calls.
///
/// Each element is handed out exactly once, as an exclusive reference, so
/// `f` never observes the same item from two threads. There is no ordering
/// guarantee between items. A panic in `f` is propagated to the caller
/// after the remaining workers finish.
pub fn for_each_bounded<T, F>(items: &mut [T], workers: usize, f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    let workers = workers.max(1).min(items.len());
    if workers <= 1 {
        items.iter_mut().for_each(f);
        return;
    }

    log::debug!("dispatching {} items to {workers} workers", items.len());
    let queue = Mutex::new(items.iter_mut());
    std::thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                // The guard is dropped at the end of this statement, so `f`
                // runs without holding the queue lock.
                let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                match next {
                    Some(item) => f(item),
                    None => break,
                }
            });
        }
    });
}
