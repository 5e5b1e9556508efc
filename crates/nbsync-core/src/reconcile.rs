// ── Get-or-create / update-if-changed ──
//
// The one place remote writes are decided. A declared record is looked up,
// created when absent, patched when any declared field diverges from the
// stored value, and otherwise left alone. Writes are idempotent, so a
// second pass over unchanged input performs no writes at all.

use serde::Serialize;
use serde_json::Value;
use strum::Display;
use tracing::info;

use nbsync_api::{Collection, Directory, Fields, Query, Resource};

use crate::error::SyncError;

/// What reconciling one record did to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// A reconciled record and how it got that way.
#[derive(Debug, Clone)]
pub struct Reconciled<R> {
    pub record: R,
    pub outcome: Outcome,
}

/// Applies declared field sets to the remote directory.
#[derive(Clone, Copy)]
pub struct Reconciler<'a> {
    directory: &'a dyn Directory,
}

impl<'a> Reconciler<'a> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self { directory }
    }

    /// Look the record up by `query`, then converge it to `desired`.
    pub async fn reconcile<R: Resource>(
        &self,
        query: &Query,
        desired: Fields,
    ) -> Result<Reconciled<R>, SyncError> {
        let current = Collection::<R>::new(self.directory).find_one(query).await?;
        self.converge(current, desired).await
    }

    /// Converge an already-fetched record (or its absence) to `desired`.
    pub async fn converge<R: Resource>(
        &self,
        current: Option<R>,
        desired: Fields,
    ) -> Result<Reconciled<R>, SyncError> {
        let collection = Collection::<R>::new(self.directory);
        let kind = R::ENDPOINT;

        let Some(current) = current else {
            let record = collection.create(&desired).await?;
            info!(%kind, record = %record.label(), id = record.id(), "created");
            return Ok(Reconciled {
                record,
                outcome: Outcome::Created,
            });
        };

        let changed = diverging_fields(&serde_json::to_value(&current)?, &desired);
        if changed.is_empty() {
            info!(%kind, record = %current.label(), id = current.id(), "unchanged");
            return Ok(Reconciled {
                record: current,
                outcome: Outcome::Unchanged,
            });
        }

        let record = collection.update(current.id(), &desired).await?;
        info!(
            %kind,
            record = %record.label(),
            id = record.id(),
            fields = ?changed,
            "updated"
        );
        Ok(Reconciled {
            record,
            outcome: Outcome::Updated,
        })
    }
}

// ── Field comparison ────────────────────────────────────────────────

/// Names of the declared fields whose stored value differs.
///
/// Fields absent from `current` compare as `null`.
pub fn diverging_fields(current: &Value, desired: &Fields) -> Vec<String> {
    desired
        .iter()
        .filter(|(key, want)| !values_equal(current.get(key.as_str()).unwrap_or(&Value::Null), want))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Type-aware equality between a stored and a declared value.
///
/// Choice objects compare by `value`, nested references by `id`, and
/// numbers numerically, including numeric strings.
pub fn values_equal(current: &Value, desired: &Value) -> bool {
    match (comparable(current), comparable(desired)) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a.as_f64(), b.as_f64()),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            numbers_equal(n.as_f64(), s.trim().parse().ok())
        }
        (a, b) => a == b,
    }
}

fn comparable(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get("value").or_else(|| map.get("id")).unwrap_or(value),
        other => other,
    }
}

fn numbers_equal(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => false,
    }
}
