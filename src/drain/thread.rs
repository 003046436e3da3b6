//! Periodic background draining.
//!
//! Complements the reconnect trigger: even without a connectivity
//! transition, pending entries are retried on a fixed interval while the
//! observer reports connected.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::QueueDrainer;
use crate::connectivity::ConnectivityObserver;
use crate::remote::RemoteStore;
use crate::storage::KeyValueStorage;

/// Statistics from the background worker.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub polls: usize,
    /// Drain passes that actually ran (not skipped as busy).
    pub passes: usize,
    pub completed: usize,
    /// Entries the remote rejected, summed over passes.
    pub failed: usize,
    /// Entries skipped for a missing or malformed key, summed over passes.
    pub invalid: usize,
    pub storage_errors: usize,
}

/// A background thread that drains the queue every poll interval.
///
/// ## Example
///
/// ```ignore
/// let worker = SyncWorkerThread::spawn(drainer.clone(), connectivity.clone(), Duration::from_secs(30));
///
/// // ... app runs ...
///
/// let stats = worker.stop();
/// println!("replayed {} operations", stats.completed);
/// ```
pub struct SyncWorkerThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<WorkerStats>>,
}

impl SyncWorkerThread {
    /// Spawn the worker. The first poll happens immediately.
    ///
    /// Each poll drains only when the observer reports connected and the
    /// queue is non-empty.
    pub fn spawn<S, R, C>(drainer: QueueDrainer<S, R>, connectivity: C, poll_interval: Duration) -> Self
    where
        S: KeyValueStorage + 'static,
        R: RemoteStore + 'static,
        C: ConnectivityObserver + 'static,
    {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = WorkerStats::default();

            loop {
                stats.polls += 1;
                poll_once(&drainer, &connectivity, &mut stats);

                match stop_rx.recv_timeout(poll_interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }

            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the worker to stop and wait for it to finish.
    pub fn stop(mut self) -> WorkerStats {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            WorkerStats::default()
        }
    }

    /// Signal the worker to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for SyncWorkerThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

fn poll_once<S, R, C>(drainer: &QueueDrainer<S, R>, connectivity: &C, stats: &mut WorkerStats)
where
    S: KeyValueStorage,
    R: RemoteStore,
    C: ConnectivityObserver,
{
    if !connectivity.is_connected() {
        return;
    }
    match drainer.store().is_empty() {
        Ok(true) => return,
        Ok(false) => {}
        Err(err) => {
            tracing::error!(error = %err, "failed to read offline queue");
            stats.storage_errors += 1;
            return;
        }
    }

    match drainer.drain() {
        Ok(result) if result.busy => {}
        Ok(result) => {
            stats.passes += 1;
            stats.completed += result.completed;
            stats.failed += result.failed;
            stats.invalid += result.invalid;
        }
        Err(err) => {
            tracing::error!(error = %err, "offline queue drain failed");
            stats.storage_errors += 1;
        }
    }
}
