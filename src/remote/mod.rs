//! The backend the queue replays into.
//!
//! Only a table-oriented request interface is assumed; the wire format is the
//! implementor's business.

mod in_memory;

pub use in_memory::{InMemoryRemote, RemoteCall};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operation::{remote_key, OperationKind};

/// Whether a rejected operation is worth sending again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryClass {
    Transient,
    Permanent,
}

impl fmt::Display for RetryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryClass::Transient => f.write_str("transient"),
            RetryClass::Permanent => f.write_str("permanent"),
        }
    }
}

/// Structured rejection returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub message: String,
    pub retry_class: RetryClass,
    pub code: Option<String>,
}

impl RemoteError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_class: RetryClass::Transient,
            code: None,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_class: RetryClass::Permanent,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Equality filter identifying the remote row for update/delete.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchKey {
    pub column: String,
    pub value: Value,
}

impl MatchKey {
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

pub trait RemoteStore: Send + Sync {
    fn insert(&self, table: &str, row: &Value) -> Result<(), RemoteError>;

    fn update(&self, table: &str, row: &Value, key: &MatchKey) -> Result<(), RemoteError>;

    fn delete(&self, table: &str, key: &MatchKey) -> Result<(), RemoteError>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    fn insert(&self, table: &str, row: &Value) -> Result<(), RemoteError> {
        (**self).insert(table, row)
    }

    fn update(&self, table: &str, row: &Value, key: &MatchKey) -> Result<(), RemoteError> {
        (**self).update(table, row, key)
    }

    fn delete(&self, table: &str, key: &MatchKey) -> Result<(), RemoteError> {
        (**self).delete(table, key)
    }
}

pub(crate) enum ApplyError {
    MissingKey,
    Remote(RemoteError),
}

/// Send one write to `remote`, resolving the match key from `payload[key_field]`.
///
/// Update and delete never reach the remote without a key.
pub(crate) fn apply<R: RemoteStore + ?Sized>(
    remote: &R,
    table: &str,
    kind: OperationKind,
    payload: &Value,
    key_field: &str,
) -> Result<(), ApplyError> {
    let key = || {
        remote_key(payload, key_field)
            .map(|value| MatchKey::new(key_field, value.clone()))
            .ok_or(ApplyError::MissingKey)
    };
    let outcome = match kind {
        OperationKind::Insert => remote.insert(table, payload),
        OperationKind::Update => remote.update(table, payload, &key()?),
        OperationKind::Delete => remote.delete(table, &key()?),
    };
    outcome.map_err(ApplyError::Remote)
}
