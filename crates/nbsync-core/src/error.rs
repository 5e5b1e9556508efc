// ── Core error types ──
//
// Errors raised while turning declarations into remote writes. Each variant
// is either scoped to the record being processed (the run skips it and moves
// on) or to the enclosing file/device unit (the rest of that unit is
// abandoned). Only the binary decides what is fatal to the process.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Record-scoped ────────────────────────────────────────────────
    /// A required reference did not resolve to exactly one remote record.
    #[error("{record}: missing dependencies: {}", .missing.join(", "))]
    MissingDependency {
        record: String,
        missing: Vec<String>,
    },

    /// A declared field could not be parsed or is out of range.
    #[error("{record}: invalid {field}: {reason}")]
    Malformed {
        record: String,
        field: &'static str,
        reason: String,
    },

    #[error("Unknown interface type: {name}")]
    UnknownInterfaceType { name: String },

    #[error("Interface range {range} runs backwards ({start} > {end})")]
    DescendingRange { range: String, start: u32, end: u32 },

    // ── Unit-scoped ──────────────────────────────────────────────────
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Cannot encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Directory(#[from] nbsync_api::Error),
}

impl SyncError {
    /// Returns `true` if only the current record is affected and processing
    /// of its file or device should continue.
    pub fn is_record_scoped(&self) -> bool {
        match self {
            Self::MissingDependency { .. }
            | Self::Malformed { .. }
            | Self::UnknownInterfaceType { .. }
            | Self::DescendingRange { .. } => true,
            Self::Directory(e) => matches!(e, nbsync_api::Error::Ambiguous { .. }),
            Self::Read { .. } | Self::Parse { .. } | Self::Encode(_) => false,
        }
    }

    pub(crate) fn malformed(
        record: impl Into<String>,
        field: &'static str,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Malformed {
            record: record.into(),
            field,
            reason: reason.to_string(),
        }
    }
}
