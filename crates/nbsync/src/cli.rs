//! Clap derive structures for the `nbsync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use nbsync_core::Kind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nbsync -- converge declared network inventory into NetBox
#[derive(Debug, Parser)]
#[command(
    name = "nbsync",
    version,
    about = "Converge declared network inventory into NetBox",
    long_about = "Reads sites, devices, VLANs, prefixes (CSV) and per-device interfaces\n\
        (YAML) and creates or updates the matching NetBox records. Records are\n\
        never deleted, and a second run over unchanged input writes nothing.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "NBSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// NetBox URL (overrides config)
    #[arg(long, short = 'u', global = true)]
    pub url: Option<String>,

    /// NetBox API token
    #[arg(long, env = "NETBOX_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Root of the declared state (CSV in <dir>/csv, YAML in <dir>/devices/interfaces)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory for the netbox.log audit file
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Summary output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the summary and non-error logs
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync CSV reference data (regions through prefixes)
    #[command(alias = "ref")]
    Reference(ReferenceArgs),

    /// Sync interfaces from per-device YAML
    #[command(alias = "if")]
    Interfaces(DeviceArgs),

    /// Sync interface IPs, primary IPv4 and VRRP addresses
    Ips(DeviceArgs),

    /// Reference data, then interfaces, then IPs
    All,

    /// List entity kinds and their CSV files
    Kinds,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ReferenceArgs {
    /// Only sync these kinds (order stays fixed), e.g. --only site,vlan
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<Kind>,
}

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Only process these devices
    #[arg(long = "device", short = 'd', value_delimiter = ',')]
    pub devices: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn only_accepts_kind_names() {
        let cli = Cli::try_parse_from(["nbsync", "reference", "--only", "device-role,VLAN"]).unwrap();
        let Command::Reference(args) = cli.command else {
            panic!("expected reference");
        };
        assert_eq!(args.only, vec![Kind::DeviceRole, Kind::Vlan]);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["nbsync", "reference", "--only", "cable"]).is_err());
    }
}
