use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies a queued entry for pruning after it has been applied.
///
/// This is not an idempotency key: the remote side never sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    pub fn generate() -> Self {
        OperationId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OperationId {
    fn from(id: &str) -> Self {
        OperationId(id.to_string())
    }
}

impl From<String> for OperationId {
    fn from(id: String) -> Self {
        OperationId(id)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    /// Whether the payload must carry the remote primary key.
    pub fn requires_key(self) -> bool {
        matches!(self, OperationKind::Update | OperationKind::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending remote write captured locally for later replay.
///
/// Field names on disk match the queue layout the mobile client already
/// writes (`table`, `operation`, `data`, `timestamp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: OperationId,
    #[serde(rename = "table")]
    pub target_collection: String,
    #[serde(rename = "operation")]
    pub kind: OperationKind,
    #[serde(rename = "data")]
    pub payload: Value,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub enqueued_at: u64,
}

impl QueuedOperation {
    /// The remote primary key carried in the payload under `field`.
    ///
    /// `null` and empty strings count as absent.
    pub fn remote_key(&self, field: &str) -> Option<&Value> {
        remote_key(&self.payload, field)
    }
}

/// The value of `field` in an object payload, treating `null` and `""` as absent.
pub fn remote_key<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    match payload.as_object()?.get(field)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        value => Some(value),
    }
}

/// Request to append a new entry; id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub target_collection: String,
    pub kind: OperationKind,
    pub payload: Value,
}

impl NewOperation {
    pub fn new(target_collection: impl Into<String>, kind: OperationKind, payload: Value) -> Self {
        Self {
            target_collection: target_collection.into(),
            kind,
            payload,
        }
    }

    pub fn insert(target_collection: impl Into<String>, payload: Value) -> Self {
        Self::new(target_collection, OperationKind::Insert, payload)
    }

    pub fn update(target_collection: impl Into<String>, payload: Value) -> Self {
        Self::new(target_collection, OperationKind::Update, payload)
    }

    pub fn delete(target_collection: impl Into<String>, payload: Value) -> Self {
        Self::new(target_collection, OperationKind::Delete, payload)
    }
}
