use thiserror::Error;

use crate::operation::{OperationId, OperationKind};
use crate::remote::{RemoteError, RetryClass};

/// Failure of the local key-value layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage lock poisoned during {0}")]
    Poisoned(&'static str),
}

/// Failure to load or persist the serialized queue.
#[derive(Debug, Error)]
pub enum QueueStorageError {
    #[error("failed to read queue: {0}")]
    Read(#[source] StorageError),
    #[error("failed to write queue: {0}")]
    Write(#[source] StorageError),
    #[error("stored queue is not valid JSON: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to encode queue: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("queue lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Storage(#[from] QueueStorageError),
    #[error("queued operation {id} is invalid: {reason}")]
    EntryInvalid { id: OperationId, reason: String },
    #[error("queued operation {id} was rejected ({retry_class}): {message}")]
    DispatchFailed {
        id: OperationId,
        retry_class: RetryClass,
        message: String,
    },
    #[error("operation payload is missing")]
    MissingPayload,
    #[error("operation target collection is missing")]
    MissingCollection,
    #[error("{kind} on {collection} needs `{field}` in the payload")]
    MissingKey {
        collection: String,
        kind: OperationKind,
        field: String,
    },
    #[error("remote rejected operation: {0}")]
    Remote(#[from] RemoteError),
}

impl QueueError {
    /// Id of the queued entry this error is about, if any.
    pub fn operation_id(&self) -> Option<&OperationId> {
        match self {
            QueueError::EntryInvalid { id, .. } | QueueError::DispatchFailed { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            QueueError::DispatchFailed { retry_class, .. } => *retry_class == RetryClass::Transient,
            QueueError::Remote(err) => err.retry_class == RetryClass::Transient,
            _ => false,
        }
    }
}
