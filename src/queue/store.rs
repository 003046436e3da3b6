use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::config::DEFAULT_QUEUE_KEY;
use crate::error::{QueueError, QueueStorageError};
use crate::operation::{NewOperation, OperationId, QueuedOperation};
use crate::storage::KeyValueStorage;

/// Durable collection of pending operations.
///
/// The whole queue is stored as one JSON array under a single key and every
/// mutation is a read-modify-write of that array. Cloned handles share an
/// in-process guard, so `append` and `remove_many` never interleave and lose
/// each other's updates. They also share the drain flag: every drainer built
/// over this queue sees the same pass in flight.
pub struct MutationQueueStore<S> {
    storage: S,
    key: String,
    clock: Arc<dyn Clock>,
    guard: Arc<Mutex<()>>,
    draining: Arc<AtomicBool>,
}

/// Held for the length of one drain pass; clears the flag on drop, including
/// by panic.
pub(crate) struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: Clone> Clone for MutationQueueStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            key: self.key.clone(),
            clock: Arc::clone(&self.clock),
            guard: Arc::clone(&self.guard),
            draining: Arc::clone(&self.draining),
        }
    }
}

impl<S: KeyValueStorage> MutationQueueStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_QUEUE_KEY.to_string(),
            clock: Arc::new(SystemClock),
            guard: Arc::new(Mutex::new(())),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Append a new entry and return its generated id.
    pub fn append(&self, request: NewOperation) -> Result<OperationId, QueueError> {
        let _guard = self.lock()?;
        let mut queue = self.read()?;
        let operation = QueuedOperation {
            id: OperationId::generate(),
            target_collection: request.target_collection,
            kind: request.kind,
            payload: request.payload,
            enqueued_at: self.clock.now_millis(),
        };
        let id = operation.id.clone();
        queue.push(operation);
        self.write(&queue)?;
        Ok(id)
    }

    /// All pending entries in stored order.
    pub fn list(&self) -> Result<Vec<QueuedOperation>, QueueError> {
        let _guard = self.lock()?;
        Ok(self.read()?)
    }

    /// Remove exactly the given ids; unknown ids are ignored.
    pub fn remove_many(&self, ids: &HashSet<OperationId>) -> Result<(), QueueError> {
        if ids.is_empty() {
            return Ok(());
        }
        let _guard = self.lock()?;
        let mut queue = self.read()?;
        let before = queue.len();
        queue.retain(|op| !ids.contains(&op.id));
        if queue.len() != before {
            self.write(&queue)?;
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize, QueueError> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }

    /// Whether a drain pass over this queue is running.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Claim the queue for one drain pass; `None` if a pass already holds it.
    pub(crate) fn try_begin_drain(&self) -> Option<DrainGuard<'_>> {
        self.draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DrainGuard(&self.draining))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, QueueStorageError> {
        self.guard.lock().map_err(|_| QueueStorageError::Poisoned)
    }

    fn read(&self) -> Result<Vec<QueuedOperation>, QueueStorageError> {
        match self.storage.get(&self.key).map_err(QueueStorageError::Read)? {
            Some(raw) => serde_json::from_str(&raw).map_err(QueueStorageError::Corrupt),
            None => Ok(Vec::new()),
        }
    }

    fn write(&self, queue: &[QueuedOperation]) -> Result<(), QueueStorageError> {
        let raw = serde_json::to_string(queue).map_err(QueueStorageError::Encode)?;
        self.storage
            .set(&self.key, &raw)
            .map_err(QueueStorageError::Write)
    }
}
