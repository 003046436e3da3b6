mod client;
mod coordinator;

pub use client::{MutationOutcome, OfflineFirstClient};
pub use coordinator::{NetworkStatus, SyncCoordinator};
