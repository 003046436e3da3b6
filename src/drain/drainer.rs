use std::collections::HashSet;
use std::sync::Arc;

use super::DrainResult;
use crate::config::SyncConfig;
use crate::error::QueueError;
use crate::operation::QueuedOperation;
use crate::queue::MutationQueueStore;
use crate::remote::{apply, ApplyError, RemoteStore};
use crate::storage::KeyValueStorage;

/// Replays queued operations against the remote store, oldest first, and
/// prunes the ones that were applied.
///
/// Passes are not transactional: entries applied before a later failure stay
/// applied. The in-flight flag lives on the queue store, so at most one pass
/// runs at a time per queue, across clones and separately built drainers.
pub struct QueueDrainer<S, R> {
    store: MutationQueueStore<S>,
    remote: R,
    config: Arc<SyncConfig>,
}

impl<S: Clone, R: Clone> Clone for QueueDrainer<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            remote: self.remote.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: KeyValueStorage, R: RemoteStore> QueueDrainer<S, R> {
    pub fn new(store: MutationQueueStore<S>, remote: R) -> Self {
        Self {
            store,
            remote,
            config: Arc::new(SyncConfig::default()),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn store(&self) -> &MutationQueueStore<S> {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_draining(&self) -> bool {
        self.store.is_draining()
    }

    /// Run one pass over the queue.
    ///
    /// Only storage failures are returned as `Err`; per-entry problems are
    /// collected in [`DrainResult::errors`] and those entries stay queued.
    /// A call that overlaps a running pass returns at once with `busy` set.
    pub fn drain(&self) -> Result<DrainResult, QueueError> {
        let Some(_in_flight) = self.store.try_begin_drain() else {
            tracing::debug!("drain already in progress, skipping");
            return Ok(DrainResult::already_running());
        };

        let mut queue = self.store.list()?;
        if queue.is_empty() {
            return Ok(DrainResult::default());
        }

        // Stored order is not enqueue order; the sort is stable so ties keep stored order.
        queue.sort_by_key(|op| op.enqueued_at);

        tracing::info!(pending = queue.len(), "draining offline queue");

        let mut result = DrainResult {
            pending: queue.len(),
            ..DrainResult::default()
        };
        let mut succeeded = HashSet::new();

        for op in &queue {
            match self.dispatch(op) {
                Ok(()) => {
                    succeeded.insert(op.id.clone());
                    result.completed += 1;
                }
                Err(err @ QueueError::EntryInvalid { .. }) => {
                    tracing::error!(id = %op.id, collection = %op.target_collection, error = %err, "skipping invalid queued operation");
                    result.invalid += 1;
                    result.errors.push(err);
                }
                Err(err) => {
                    if err.is_transient() {
                        tracing::warn!(id = %op.id, collection = %op.target_collection, error = %err, "queued operation failed, will retry");
                    } else {
                        tracing::error!(id = %op.id, collection = %op.target_collection, error = %err, "queued operation rejected");
                    }
                    result.failed += 1;
                    result.errors.push(err);
                }
            }
        }

        self.store.remove_many(&succeeded)?;

        tracing::info!(
            completed = result.completed,
            invalid = result.invalid,
            failed = result.failed,
            "offline queue drain finished"
        );
        Ok(result)
    }

    fn dispatch(&self, op: &QueuedOperation) -> Result<(), QueueError> {
        let field = self.config.key_field_for(&op.target_collection);
        apply(&self.remote, &op.target_collection, op.kind, &op.payload, field).map_err(
            |err| match err {
                ApplyError::MissingKey => QueueError::EntryInvalid {
                    id: op.id.clone(),
                    reason: format!("missing `{}` for {} operation", field, op.kind),
                },
                ApplyError::Remote(err) => QueueError::DispatchFailed {
                    id: op.id.clone(),
                    retry_class: err.retry_class,
                    message: err.to_string(),
                },
            },
        )
    }
}
