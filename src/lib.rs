//! Offline mutation queue for table-oriented backends.
//!
//! Writes that cannot reach the backend are appended to a durable queue
//! ([`MutationQueueStore`]) and replayed oldest-first by a [`QueueDrainer`]
//! once a [`ConnectivityObserver`] reports the device back online.

mod clock;
mod config;
mod error;
mod operation;

pub mod connectivity;
pub mod drain;
pub mod queue;
pub mod remote;
pub mod storage;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SyncConfig, DEFAULT_KEY_FIELD, DEFAULT_POLL_INTERVAL_MS, DEFAULT_QUEUE_KEY};
pub use connectivity::{
    ConnectivityCallback, ConnectivityObserver, ManualConnectivity, Subscription,
};
pub use drain::{DrainResult, QueueDrainer, SyncWorkerThread, WorkerStats};
pub use error::{QueueError, QueueStorageError, StorageError};
pub use operation::{NewOperation, OperationId, OperationKind, QueuedOperation};
pub use queue::{MutationQueueStore, QueueWriter};
pub use remote::{InMemoryRemote, MatchKey, RemoteCall, RemoteError, RemoteStore, RetryClass};
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage};
pub use sync::{MutationOutcome, NetworkStatus, OfflineFirstClient, SyncCoordinator};
