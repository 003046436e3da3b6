use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::SystemTime;

use crate::connectivity::{ConnectivityObserver, Subscription};
use crate::drain::{DrainResult, QueueDrainer};
use crate::error::QueueError;
use crate::remote::RemoteStore;
use crate::storage::KeyValueStorage;

/// Snapshot of what the host UI shows about sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStatus {
    pub is_connected: bool,
    pub last_connected: Option<SystemTime>,
    pub pending_operations: usize,
}

/// Drains the queue whenever connectivity comes back.
///
/// Each drain runs on its own thread and re-reads the connectivity state
/// after seeing pending entries, so a device that drops offline between the
/// trigger and the pass does not reach the network.
pub struct SyncCoordinator<S, R, C> {
    drainer: QueueDrainer<S, R>,
    connectivity: C,
    last_connected: Arc<Mutex<Option<SystemTime>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<S, R, C> SyncCoordinator<S, R, C>
where
    S: KeyValueStorage + Clone + 'static,
    R: RemoteStore + Clone + 'static,
    C: ConnectivityObserver + Clone + 'static,
{
    pub fn new(drainer: QueueDrainer<S, R>, connectivity: C) -> Self {
        Self {
            drainer,
            connectivity,
            last_connected: Arc::new(Mutex::new(None)),
            subscription: Mutex::new(None),
        }
    }

    pub fn drainer(&self) -> &QueueDrainer<S, R> {
        &self.drainer
    }

    /// Start listening for connectivity transitions.
    ///
    /// Also runs the initial check: if already connected with pending
    /// entries, a drain is started right away. Calling `start` again
    /// replaces the previous listener.
    pub fn start(&self) {
        if self.connectivity.is_connected() {
            record_connected(&self.last_connected);
            spawn_drain_if_pending(self.drainer.clone(), self.connectivity.clone());
        }

        let drainer = self.drainer.clone();
        let connectivity = self.connectivity.clone();
        let last_connected = Arc::clone(&self.last_connected);
        let subscription = self.connectivity.on_change(Box::new(move |connected| {
            if connected {
                record_connected(&last_connected);
                spawn_drain_if_pending(drainer.clone(), connectivity.clone());
            }
        }));

        *lock(&self.subscription) = Some(subscription);
    }

    /// Stop listening. Drains already started run to completion.
    pub fn stop(&self) {
        lock(&self.subscription).take();
    }

    pub fn is_started(&self) -> bool {
        lock(&self.subscription).is_some()
    }

    /// Drain now if connected; `None` when offline.
    pub fn try_sync(&self) -> Result<Option<DrainResult>, QueueError> {
        if !self.connectivity.is_connected() {
            return Ok(None);
        }
        self.drainer.drain().map(Some)
    }

    pub fn status(&self) -> Result<NetworkStatus, QueueError> {
        Ok(NetworkStatus {
            is_connected: self.connectivity.is_connected(),
            last_connected: *lock(&self.last_connected),
            pending_operations: self.drainer.store().len()?,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn record_connected(last_connected: &Mutex<Option<SystemTime>>) {
    *lock(last_connected) = Some(SystemTime::now());
}

/// Fire-and-forget: the caller never waits on the network.
///
/// Pending is checked before connectivity, so an offline transition made
/// before the entry was enqueued is always seen.
fn spawn_drain_if_pending<S, R, C>(drainer: QueueDrainer<S, R>, connectivity: C)
where
    S: KeyValueStorage + 'static,
    R: RemoteStore + 'static,
    C: ConnectivityObserver + 'static,
{
    thread::spawn(move || {
        match drainer.store().is_empty() {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                tracing::error!(error = %err, "failed to read offline queue");
                return;
            }
        }
        if !connectivity.is_connected() {
            tracing::debug!("connectivity lost before drain, skipping");
            return;
        }
        if let Err(err) = drainer.drain() {
            tracing::error!(error = %err, "offline queue drain failed");
        }
    });
}
