//! Configuration for nbsync.
//!
//! Built-in defaults, then a TOML file, then `NBSYNC_*` environment
//! variables; the CLI applies its flags on top. Also resolves the API
//! token and translates settings into the HTTP transport.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nbsync_api::{TlsMode, TransportConfig};

/// Environment variable conventionally holding the NetBox API token.
pub const TOKEN_ENV: &str = "NETBOX_TOKEN";

/// Prefix of environment variables overriding config keys.
pub const ENV_PREFIX: &str = "NBSYNC_";

/// Name of the audit log written under `log_dir`.
pub const LOG_FILE: &str = "netbox.log";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured (set {TOKEN_ENV}, `token` or `token_env`)")]
    NoToken,

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// NetBox base URL; `/api/` is appended when missing.
    #[serde(default = "default_url")]
    pub url: String,

    /// API token (plaintext, prefer `NETBOX_TOKEN` or `token_env`).
    pub token: Option<String>,

    /// Environment variable name containing the API token.
    pub token_env: Option<String>,

    /// Root of the declared state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// CSV directory; defaults to `<data_dir>/csv`.
    pub csv_dir: Option<PathBuf>,

    /// Per-device YAML directory; defaults to `<data_dir>/devices/interfaces`.
    pub interfaces_dir: Option<PathBuf>,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            token_env: None,
            data_dir: default_data_dir(),
            csv_dir: None,
            interfaces_dir: None,
            log_dir: default_log_dir(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_url() -> String {
    "http://127.0.0.1:8080/".into()
}
fn default_data_dir() -> PathBuf {
    "data".into()
}
fn default_log_dir() -> PathBuf {
    "logs".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    5
}

impl Config {
    pub fn csv_dir(&self) -> PathBuf {
        self.csv_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("csv"))
    }

    pub fn interfaces_dir(&self) -> PathBuf {
        self.interfaces_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("devices").join("interfaces"))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE)
    }

    /// Create `log_dir` if needed and return the audit log path.
    pub fn prepare_log_file(&self) -> Result<PathBuf, ConfigError> {
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(self.log_file())
    }

    /// Parsed base URL.
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        let url: url::Url = self.url.parse().map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: format!("{e}: {}", self.url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "url".into(),
                reason: format!("expected http or https, got '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Resolve the API token: `token_env` variable, then `NETBOX_TOKEN`,
    /// then the plaintext `token`.
    pub fn resolve_token(&self) -> Result<SecretString, ConfigError> {
        let from_env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(val) = self.token_env.as_deref().and_then(from_env) {
            return Ok(SecretString::from(val));
        }
        if let Some(val) = from_env(TOKEN_ENV) {
            return Ok(SecretString::from(val));
        }
        if let Some(token) = self.token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(SecretString::from(token.to_owned()));
        }
        Err(ConfigError::NoToken)
    }

    /// HTTP transport settings.
    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "nbsync", "nbsync").map_or_else(
        || PathBuf::from("nbsync.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` (or the default location) + environment.
///
/// A missing file is not an error; its keys simply keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX));

    let config: Config = figment.extract()?;
    Ok(config)
}
