use serde_json::Value;

use crate::config::SyncConfig;
use crate::connectivity::ConnectivityObserver;
use crate::error::QueueError;
use crate::operation::{OperationId, OperationKind};
use crate::queue::QueueWriter;
use crate::remote::{apply, ApplyError, RemoteStore};
use crate::storage::KeyValueStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Sent to the remote store immediately.
    Applied,
    /// Captured for replay once connectivity returns.
    Queued(OperationId),
}

/// Write path for data services: direct when online, queued when offline.
///
/// Online failures are returned to the caller, not queued.
pub struct OfflineFirstClient<S, R, C> {
    writer: QueueWriter<S>,
    remote: R,
    connectivity: C,
    config: SyncConfig,
}

impl<S, R, C> OfflineFirstClient<S, R, C>
where
    S: KeyValueStorage,
    R: RemoteStore,
    C: ConnectivityObserver,
{
    pub fn new(writer: QueueWriter<S>, remote: R, connectivity: C) -> Self {
        Self {
            writer,
            remote,
            connectivity,
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn writer(&self) -> &QueueWriter<S> {
        &self.writer
    }

    pub fn insert(&self, table: &str, row: Value) -> Result<MutationOutcome, QueueError> {
        self.mutate(table, OperationKind::Insert, row)
    }

    /// `row` must carry the table's key field.
    pub fn update(&self, table: &str, row: Value) -> Result<MutationOutcome, QueueError> {
        self.mutate(table, OperationKind::Update, row)
    }

    /// `row` must carry the table's key field; other fields are ignored.
    pub fn delete(&self, table: &str, row: Value) -> Result<MutationOutcome, QueueError> {
        self.mutate(table, OperationKind::Delete, row)
    }

    pub fn mutate(
        &self,
        table: &str,
        kind: OperationKind,
        payload: Value,
    ) -> Result<MutationOutcome, QueueError> {
        if !self.connectivity.is_connected() {
            let id = self.writer.enqueue(table, kind, payload)?;
            return Ok(MutationOutcome::Queued(id));
        }

        let field = self.config.key_field_for(table);
        apply(&self.remote, table, kind, &payload, field).map_err(|err| match err {
            ApplyError::MissingKey => QueueError::MissingKey {
                collection: table.to_string(),
                kind,
                field: field.to_string(),
            },
            ApplyError::Remote(err) => QueueError::Remote(err),
        })?;
        Ok(MutationOutcome::Applied)
    }
}
