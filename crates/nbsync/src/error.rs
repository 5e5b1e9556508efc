//! CLI error types with miette diagnostics.
//!
//! Maps startup failures (config, token, connectivity) into user-facing
//! errors with actionable help text. Per-record problems never reach here;
//! they are logged and tallied by the synchronizer.

use miette::Diagnostic;
use thiserror::Error;

use nbsync_api::Error as ApiError;
use nbsync_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach NetBox at {url}")]
    #[diagnostic(
        code(nbsync::connection_failed),
        help(
            "Check that NetBox is running and accessible.\n\
             URL: {url}\n\
             Override with --url or NBSYNC_URL."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed for {url}: {reason}")]
    #[diagnostic(
        code(nbsync::tls_error),
        help(
            "NetBox may be using a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or set ca_cert in the config file."
        )
    )]
    TlsError { url: String, reason: String },

    #[error("{url} does not look like a NetBox API root: {reason}")]
    #[diagnostic(
        code(nbsync::not_netbox),
        help("Point --url at the NetBox base URL, e.g. https://netbox.example.net/")
    )]
    NotNetBox { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed against {url}")]
    #[diagnostic(
        code(nbsync::auth_failed),
        help("Verify the API token and that it has write permission.")
    )]
    AuthFailed { url: String },

    #[error("No API token configured")]
    #[diagnostic(
        code(nbsync::no_token),
        help(
            "Set NETBOX_TOKEN, pass --token, or set `token` / `token_env`\n\
             in the config file."
        )
    )]
    NoToken,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nbsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(nbsync::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render the summary: {0}")]
    #[diagnostic(code(nbsync::render))]
    Render(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoToken => Self::NoToken,
            ConfigError::Figment(err) => Self::Config(err),
            ConfigError::Io(err) => Self::Io(err),
        }
    }
}

impl CliError {
    /// Classify a failed startup probe against `url`.
    pub fn from_probe(url: &str, err: ApiError) -> Self {
        let url = url.to_owned();
        match err {
            ApiError::Authentication { .. } => Self::AuthFailed { url },
            ApiError::Tls(reason) => Self::TlsError { url, reason },
            err if err.is_unreachable() || err.is_transient() => Self::ConnectionFailed {
                url,
                source: Box::new(err),
            },
            err => Self::NotNetBox {
                url,
                reason: err.to_string(),
            },
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } | Self::NotNetBox { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoToken => exit_code::AUTH,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::Io(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}
