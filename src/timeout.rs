use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

use crate::error::AnalysisError;

/// Run `func` on a worker thread and wait at most `deadline` for its result.
///
/// The worker cannot be interrupted; a late result is dropped when it arrives.
pub fn run_with_deadline<T, F>(func: F, deadline: Duration) -> Result<T, AnalysisError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name("analysis-worker".to_string())
        .spawn(move || {
            // The receiver is gone once the deadline passed.
            let _ = tx.send(func());
        })
        .map_err(|_| AnalysisError::WorkerLost)?;

    match rx.recv_timeout(deadline) {
        Ok(result) => Ok(result),
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("Analysis exceeded {:?}, discarding its result", deadline);
            Err(AnalysisError::DeadlineExceeded(deadline))
        }
        Err(RecvTimeoutError::Disconnected) => Err(AnalysisError::WorkerLost),
    }
}
