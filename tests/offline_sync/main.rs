//! Offline queue integration tests.
//!
//! - Drain semantics: ordering, pruning, invalid entries, partial failure
//! - Concurrency: overlapping drains, appends during a pass
//! - Connectivity: reconnect triggers and the periodic worker
//! - Offline-first client and durable file storage

mod support;
mod client;
mod drain;
mod durability;
