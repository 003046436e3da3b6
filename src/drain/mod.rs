mod drainer;
mod thread;

pub use drainer::QueueDrainer;
pub use thread::{SyncWorkerThread, WorkerStats};

use crate::error::QueueError;
use crate::operation::OperationId;
use crate::remote::RetryClass;

/// Outcome of one drain pass.
#[derive(Debug, Default)]
pub struct DrainResult {
    /// Entries found in the queue at the start of the pass.
    pub pending: usize,
    /// Entries applied remotely and removed.
    pub completed: usize,
    /// Update/delete entries skipped for lack of a remote key.
    pub invalid: usize,
    /// Entries the remote rejected.
    pub failed: usize,
    /// Another pass was already running; nothing was done.
    pub busy: bool,
    pub errors: Vec<QueueError>,
}

impl DrainResult {
    /// Entries still queued after this pass because of an error.
    pub fn retained(&self) -> usize {
        self.invalid + self.failed
    }

    fn already_running() -> Self {
        Self {
            busy: true,
            ..Self::default()
        }
    }

    /// Ids of entries that stayed queued because of an error.
    pub fn retained_ids(&self) -> Vec<&OperationId> {
        self.errors.iter().filter_map(QueueError::operation_id).collect()
    }

    /// Ids rejected with a permanent error; they are retried every pass anyway.
    pub fn permanently_failed_ids(&self) -> Vec<&OperationId> {
        self.errors
            .iter()
            .filter_map(|err| match err {
                QueueError::DispatchFailed {
                    id,
                    retry_class: RetryClass::Permanent,
                    ..
                } => Some(id),
                _ => None,
            })
            .collect()
    }
}
