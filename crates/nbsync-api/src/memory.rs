// ── In-process directory ──
//
// Stores records as JSON objects per endpoint and applies the same exact-
// match filter semantics as the REST API, so sync routines can run offline
// and be asserted on without an HTTP server.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::directory::{Directory, Endpoint, Fields, Query};
use crate::error::Error;

/// Kind of mutation recorded by [`MemoryDirectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
}

/// One create/update applied to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub op: WriteOp,
    pub endpoint: Endpoint,
    pub id: u64,
}

#[derive(Default)]
struct State {
    next_id: u64,
    tables: HashMap<Endpoint, Vec<Value>>,
    writes: Vec<Write>,
    failing: Vec<Endpoint>,
}

/// A [`Directory`] held entirely in memory.
#[derive(Default)]
pub struct MemoryDirectory {
    state: Mutex<State>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the records from the others.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seed a record without logging a write. Returns its assigned id.
    pub fn insert(&self, endpoint: Endpoint, record: Value) -> u64 {
        let mut state = self.lock();
        let id = state.allocate();
        let record = with_id(record, id);
        state.tables.entry(endpoint).or_default().push(record);
        id
    }

    /// Snapshot of every record in `endpoint`, in insertion order.
    pub fn records(&self, endpoint: Endpoint) -> Vec<Value> {
        self.lock().tables.get(&endpoint).cloned().unwrap_or_default()
    }

    /// A single record by id.
    pub fn get(&self, endpoint: Endpoint, id: u64) -> Option<Value> {
        self.lock()
            .tables
            .get(&endpoint)?
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
    }

    /// Every create/update applied since construction (or the last clear).
    pub fn writes(&self) -> Vec<Write> {
        self.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Make every operation on `endpoint` fail with an HTTP 500.
    pub fn fail_endpoint(&self, endpoint: Endpoint) {
        self.lock().failing.push(endpoint);
    }
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, endpoint: Endpoint) -> Result<(), Error> {
        if self.failing.contains(&endpoint) {
            return Err(Error::Api {
                status: 500,
                message: format!("{endpoint} unavailable"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn find_many(&self, endpoint: Endpoint, query: &Query) -> Result<Vec<Value>, Error> {
        let state = self.lock();
        state.check(endpoint)?;
        Ok(state
            .tables
            .get(&endpoint)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, endpoint: Endpoint, fields: &Fields) -> Result<Value, Error> {
        let mut state = self.lock();
        state.check(endpoint)?;
        let id = state.allocate();
        let record = with_id(Value::Object(fields.clone()), id);
        state.tables.entry(endpoint).or_default().push(record.clone());
        state.writes.push(Write {
            op: WriteOp::Create,
            endpoint,
            id,
        });
        Ok(record)
    }

    async fn update(&self, endpoint: Endpoint, id: u64, fields: &Fields) -> Result<Value, Error> {
        let mut state = self.lock();
        state.check(endpoint)?;
        let record = state
            .tables
            .get_mut(&endpoint)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("{endpoint} #{id} not found"),
            })?;

        if let Value::Object(map) = record {
            for (key, value) in fields {
                map.insert(key.clone(), value.clone());
            }
        }
        let updated = record.clone();
        state.writes.push(Write {
            op: WriteOp::Update,
            endpoint,
            id,
        });
        Ok(updated)
    }
}

// ── Filter semantics ────────────────────────────────────────────────

fn with_id(record: Value, id: u64) -> Value {
    match record {
        Value::Object(mut map) => {
            map.insert("id".into(), Value::from(id));
            Value::Object(map)
        }
        other => other,
    }
}

fn record_id(record: &Value) -> Option<u64> {
    record.get("id").and_then(Value::as_u64)
}

/// `key=value` matches the field `key`, or for `<field>_id` keys the id of
/// the reference stored under `<field>`.
fn matches(record: &Value, query: &Query) -> bool {
    query.params().iter().all(|(key, expected)| {
        let field = record.get(key.as_str()).or_else(|| {
            key.strip_suffix("_id")
                .and_then(|base| record.get(base))
        });
        field.and_then(scalar).as_deref() == Some(expected.as_str())
    })
}

/// Render a field the way it would appear in a query string.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("value"))
            .and_then(scalar),
        Value::Null | Value::Array(_) => None,
    }
}
