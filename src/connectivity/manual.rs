use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use event_emitter_rs::EventEmitter;

use super::{ConnectivityCallback, ConnectivityObserver, Subscription};

const CONNECTIVITY_CHANGED: &str = "ConnectivityChanged";

struct Inner {
    connected: AtomicBool,
    emitter: Mutex<EventEmitter>,
}

impl Inner {
    fn emitter(&self) -> MutexGuard<'_, EventEmitter> {
        self.emitter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Connectivity state pushed in by the host.
///
/// Platform glue (or a test) calls [`set_connected`](Self::set_connected);
/// listeners hear about actual transitions only. Every listener has finished
/// with one transition before `set_connected` returns, so listeners see
/// transitions in the order they were made. Listeners run while the state is
/// locked and must not subscribe or unsubscribe from inside the callback.
///
/// Cloning creates another handle to the same state.
#[derive(Clone)]
pub struct ManualConnectivity {
    inner: Arc<Inner>,
}

impl ManualConnectivity {
    pub fn new(connected: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                connected: AtomicBool::new(connected),
                emitter: Mutex::new(EventEmitter::new()),
            }),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    /// Update the state; returns whether it changed.
    pub fn set_connected(&self, connected: bool) -> bool {
        let mut emitter = self.inner.emitter();
        let previous = self.inner.connected.swap(connected, Ordering::SeqCst);
        if previous == connected {
            return false;
        }
        tracing::info!(connected, "connectivity changed");
        for listener in emitter.emit(CONNECTIVITY_CHANGED, connected) {
            if listener.join().is_err() {
                tracing::error!(connected, "connectivity listener panicked");
            }
        }
        true
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::online()
    }
}

impl ConnectivityObserver for ManualConnectivity {
    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    fn on_change(&self, callback: ConnectivityCallback) -> Subscription {
        let id = self
            .inner
            .emitter()
            .on(CONNECTIVITY_CHANGED, move |connected: bool| callback(connected));

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.emitter().remove_listener(&id);
            }
        })
    }
}
