// ── Run report ──

use std::collections::BTreeMap;

use serde::Serialize;

use crate::kind::Kind;
use crate::reconcile::Outcome;

/// Decisions taken for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Declarations not applied (unresolved references, bad fields).
    pub skipped: usize,
    /// Files or devices abandoned after an unexpected error.
    pub failed: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped + self.failed
    }

    fn absorb(&mut self, other: &Tally) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Per-kind tallies for a whole run, ordered by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SyncReport {
    kinds: BTreeMap<Kind, Tally>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: Kind, outcome: Outcome) {
        let tally = self.kinds.entry(kind).or_default();
        match outcome {
            Outcome::Created => tally.created += 1,
            Outcome::Updated => tally.updated += 1,
            Outcome::Unchanged => tally.unchanged += 1,
        }
    }

    pub fn skip(&mut self, kind: Kind) {
        self.kinds.entry(kind).or_default().skipped += 1;
    }

    pub fn fail(&mut self, kind: Kind) {
        self.kinds.entry(kind).or_default().failed += 1;
    }

    pub fn get(&self, kind: Kind) -> Tally {
        self.kinds.get(&kind).copied().unwrap_or_default()
    }

    pub fn rows(&self) -> impl Iterator<Item = (Kind, &Tally)> {
        self.kinds.iter().map(|(kind, tally)| (*kind, tally))
    }

    pub fn totals(&self) -> Tally {
        let mut totals = Tally::default();
        for tally in self.kinds.values() {
            totals.absorb(tally);
        }
        totals
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Number of writes the run performed.
    pub fn writes(&self) -> usize {
        let totals = self.totals();
        totals.created + totals.updated
    }
}
