use serde_json::Value;

use super::MutationQueueStore;
use crate::error::QueueError;
use crate::operation::{NewOperation, OperationId, OperationKind};
use crate::storage::KeyValueStorage;

/// Captures local mutations that cannot be sent right now.
pub struct QueueWriter<S> {
    store: MutationQueueStore<S>,
}

impl<S: Clone> Clone for QueueWriter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: KeyValueStorage> QueueWriter<S> {
    pub fn new(store: MutationQueueStore<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MutationQueueStore<S> {
        &self.store
    }

    /// Queue a write against `target_collection`.
    ///
    /// The payload shape is not checked here; update/delete entries without a
    /// remote key are rejected per entry at drain time.
    pub fn enqueue(
        &self,
        target_collection: &str,
        kind: OperationKind,
        payload: Value,
    ) -> Result<OperationId, QueueError> {
        if target_collection.is_empty() {
            return Err(QueueError::MissingCollection);
        }
        if payload.is_null() {
            return Err(QueueError::MissingPayload);
        }

        let id = self
            .store
            .append(NewOperation::new(target_collection, kind, payload))?;
        tracing::debug!(%id, collection = target_collection, %kind, "queued offline operation");
        Ok(id)
    }

    /// Fire-and-forget enqueue: failures are logged and dropped.
    pub fn enqueue_detached(
        &self,
        target_collection: &str,
        kind: OperationKind,
        payload: Value,
    ) -> Option<OperationId> {
        match self.enqueue(target_collection, kind, payload) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::error!(error = %err, collection = target_collection, %kind, "failed to queue offline operation");
                None
            }
        }
    }
}
