//! In-memory backend for testing and offline development.
//!
//! Records every call in order, applies writes to in-memory tables, and can
//! be scripted to reject calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;

use super::{MatchKey, RemoteError, RemoteStore, RetryClass};
use crate::operation::OperationKind;

/// A call observed by [`InMemoryRemote`], successful or not.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Insert { table: String, row: Value },
    Update { table: String, row: Value, key: MatchKey },
    Delete { table: String, key: MatchKey },
}

impl RemoteCall {
    pub fn table(&self) -> &str {
        match self {
            RemoteCall::Insert { table, .. }
            | RemoteCall::Update { table, .. }
            | RemoteCall::Delete { table, .. } => table,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            RemoteCall::Insert { .. } => OperationKind::Insert,
            RemoteCall::Update { .. } => OperationKind::Update,
            RemoteCall::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Row sent with the call; `None` for deletes.
    pub fn row(&self) -> Option<&Value> {
        match self {
            RemoteCall::Insert { row, .. } | RemoteCall::Update { row, .. } => Some(row),
            RemoteCall::Delete { .. } => None,
        }
    }
}

type Predicate = Box<dyn Fn(&RemoteCall) -> bool + Send + Sync>;

struct FailureRule {
    matches: Predicate,
    retry_class: RetryClass,
}

#[derive(Default)]
struct State {
    calls: Vec<RemoteCall>,
    tables: HashMap<String, Vec<Value>>,
    failures: Vec<FailureRule>,
    delay: Option<Duration>,
}

/// Cloning creates another handle to the same recorded state.
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    state: Arc<Mutex<State>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every call against `table`.
    pub fn fail_table(&self, table: &str, retry_class: RetryClass) {
        let table = table.to_string();
        self.fail_when(move |call| call.table() == table, retry_class);
    }

    /// Reject calls matching `predicate`.
    pub fn fail_when<F>(&self, predicate: F, retry_class: RetryClass)
    where
        F: Fn(&RemoteCall) -> bool + Send + Sync + 'static,
    {
        self.state().failures.push(FailureRule {
            matches: Box::new(predicate),
            retry_class,
        });
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Sleep this long inside every call before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Current rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let delay = {
            let mut state = self.state();
            state.calls.push(call.clone());
            state.delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut state = self.state();
        if let Some(rule) = state.failures.iter().find(|rule| (rule.matches)(&call)) {
            let message = format!("{} on {} rejected", call.kind(), call.table());
            return Err(match rule.retry_class {
                RetryClass::Transient => RemoteError::transient(message),
                RetryClass::Permanent => RemoteError::permanent(message),
            });
        }

        match call {
            RemoteCall::Insert { table, row } => {
                state.tables.entry(table).or_default().push(row);
            }
            RemoteCall::Update { table, row, key } => {
                if let Some(rows) = state.tables.get_mut(&table) {
                    for existing in rows.iter_mut().filter(|r| key.matches(r)) {
                        merge(existing, &row);
                    }
                }
            }
            RemoteCall::Delete { table, key } => {
                if let Some(rows) = state.tables.get_mut(&table) {
                    rows.retain(|r| !key.matches(r));
                }
            }
        }
        Ok(())
    }
}

fn merge(target: &mut Value, patch: &Value) {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(target), Some(patch)) => {
            for (field, value) in patch {
                target.insert(field.clone(), value.clone());
            }
        }
        _ => *target = patch.clone(),
    }
}

impl RemoteStore for InMemoryRemote {
    fn insert(&self, table: &str, row: &Value) -> Result<(), RemoteError> {
        self.handle(RemoteCall::Insert {
            table: table.to_string(),
            row: row.clone(),
        })
    }

    fn update(&self, table: &str, row: &Value, key: &MatchKey) -> Result<(), RemoteError> {
        self.handle(RemoteCall::Update {
            table: table.to_string(),
            row: row.clone(),
            key: key.clone(),
        })
    }

    fn delete(&self, table: &str, key: &MatchKey) -> Result<(), RemoteError> {
        self.handle(RemoteCall::Delete {
            table: table.to_string(),
            key: key.clone(),
        })
    }
}
