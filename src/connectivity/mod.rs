//! Network reachability as seen by the queue.
//!
//! Detecting reachability is the host platform's job; the queue only reads
//! the current state and listens for transitions.

mod manual;

pub use manual::ManualConnectivity;

use std::fmt;
use std::sync::Arc;

pub type ConnectivityCallback = Box<dyn Fn(bool) + Send + Sync + 'static>;

pub trait ConnectivityObserver: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Register `callback` to receive the new state on every transition.
    fn on_change(&self, callback: ConnectivityCallback) -> Subscription;
}

impl<T: ConnectivityObserver + ?Sized> ConnectivityObserver for Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn on_change(&self, callback: ConnectivityCallback) -> Subscription {
        (**self).on_change(callback)
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
