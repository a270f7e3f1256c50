//! Wall-clock deadlines for untrusted work
//!
//! [`run_with_deadline`] runs a closure on a background thread and races it
//! against a timer. If the timer wins the caller gets
//! [`GuardError::DeadlineExceeded`]; the worker is detached, never retried.

use crossbeam::channel::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Deadline guard failures
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// Work did not finish in time
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Worker thread panicked before producing a value
    #[error("guarded worker panicked")]
    WorkerPanicked,

    /// Worker thread could not be started
    #[error("failed to spawn guarded worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Run `work` on a named background thread, waiting at most `deadline`
///
/// # Errors
/// [`GuardError::DeadlineExceeded`] when the timer wins,
/// [`GuardError::WorkerPanicked`] when the worker dies without a result.
pub fn run_with_deadline<T, F>(name: &str, deadline: Duration, work: F) -> Result<T, GuardError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = channel::bounded(1);
    thread::Builder::new()
        .name(format!("guard-{name}"))
        .spawn(move || {
            // receiver may already have timed out
            let _ = tx.send(work());
        })
        .map_err(GuardError::Spawn)?;

    match rx.recv_timeout(deadline) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => Err(GuardError::DeadlineExceeded(deadline)),
        Err(RecvTimeoutError::Disconnected) => Err(GuardError::WorkerPanicked),
    }
}
