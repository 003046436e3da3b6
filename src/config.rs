use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_QUEUE_KEY: &str = "offlineSyncQueue";
pub const DEFAULT_KEY_FIELD: &str = "id";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Settings shared by the queue store, drainer and background worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Storage key the serialized queue lives under.
    pub queue_key: String,
    /// How often the background worker checks for pending entries.
    pub poll_interval_ms: u64,
    /// Payload field carrying the remote primary key for update/delete.
    pub key_field: String,
    /// Per-collection overrides of `key_field`.
    pub key_fields: HashMap<String, String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            key_field: DEFAULT_KEY_FIELD.to_string(),
            key_fields: HashMap::new(),
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn with_queue_key(mut self, key: impl Into<String>) -> Self {
        self.queue_key = key.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }

    /// Use `field` as the remote key for one collection only.
    pub fn with_collection_key(
        mut self,
        collection: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.key_fields.insert(collection.into(), field.into());
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn key_field_for(&self, collection: &str) -> &str {
        self.key_fields
            .get(collection)
            .map(String::as_str)
            .unwrap_or(self.key_field.as_str())
    }
}
