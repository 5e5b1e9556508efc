use thiserror::Error;

use crate::directory::Endpoint;

/// Top-level error type for the `nbsync-api` crate.
///
/// Covers every failure mode of the remote directory: authentication,
/// transport, API rejections, undecodable payloads, and lookups that
/// matched more than one record. `nbsync-core` decides which of these end a
/// record, a file, or the whole run.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected (HTTP 401) or lacking permission (HTTP 403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success response from the API, with the body's error detail.
    #[error("NetBox API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A lookup expected at most one record but the filter matched several.
    #[error("{endpoint} lookup {query} matched {count} records, expected at most one")]
    Ambiguous {
        endpoint: Endpoint,
        query: String,
        count: usize,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the remote directory could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::Tls(_) => true,
            _ => false,
        }
    }
}
