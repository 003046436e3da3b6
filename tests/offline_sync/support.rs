//! Shared fixture: an in-memory queue, a manual clock and a recording remote.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use offline_sync::{
    InMemoryRemote, InMemoryStorage, ManualClock, MutationQueueStore, QueueDrainer, QueueWriter,
};

pub struct Fixture {
    pub storage: InMemoryStorage,
    pub clock: ManualClock,
    pub remote: InMemoryRemote,
    pub store: MutationQueueStore<InMemoryStorage>,
    pub writer: QueueWriter<InMemoryStorage>,
    pub drainer: QueueDrainer<InMemoryStorage, InMemoryRemote>,
}

impl Fixture {
    pub fn new() -> Self {
        let storage = InMemoryStorage::new();
        let clock = ManualClock::new(1);
        let remote = InMemoryRemote::new();
        let store = MutationQueueStore::new(storage.clone()).with_clock(clock.clone());
        let writer = QueueWriter::new(store.clone());
        let drainer = QueueDrainer::new(store.clone(), remote.clone());

        Self {
            storage,
            clock,
            remote,
            store,
            writer,
            drainer,
        }
    }

    pub fn pending(&self) -> usize {
        self.store.len().unwrap()
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
