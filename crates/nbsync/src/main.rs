mod cli;
mod error;
mod output;

use clap::Parser;
use secrecy::SecretString;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use nbsync_api::NetBoxClient;
use nbsync_config::Config;
use nbsync_core::Synchronizer;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::{CliError, exit_code};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(exit_code::SUCCESS),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}

/// Console output on stderr by verbosity, plus the audit log at INFO.
///
/// The returned guard flushes the file writer and must outlive the run.
fn init_tracing(global: &GlobalOpts, config: &Config) -> Result<WorkerGuard, CliError> {
    let level = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    config.prepare_log_file()?;
    let file_appender = tracing_appender::rolling::never(&config.log_dir, nbsync_config::LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_filter(EnvFilter::new("info")),
        )
        .init();

    Ok(guard)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local commands need neither config nor a connection
        Command::Kinds => {
            let out = output::render_kinds(cli.global.output)?;
            output::print_output(&out, cli.global.quiet);
            Ok(())
        }

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "nbsync", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let config = build_config(&cli.global)?;
            let _guard = init_tracing(&cli.global, &config)?;
            let client = connect(&cli.global, &config).await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let mut sync = Synchronizer::new(&client);
            dispatch(&mut sync, cmd, &config).await;

            let report = sync.into_report();
            let totals = report.totals();
            tracing::info!(
                created = totals.created,
                updated = totals.updated,
                unchanged = totals.unchanged,
                skipped = totals.skipped,
                failed = totals.failed,
                writes = report.writes(),
                "sync finished"
            );

            let out = output::render_report(cli.global.output, &report)?;
            output::print_output(&out, cli.global.quiet);
            Ok(())
        }
    }
}

/// Run the passes a sync command selects, in dependency order.
async fn dispatch(sync: &mut Synchronizer<'_>, cmd: Command, config: &Config) {
    let csv_dir = config.csv_dir();
    let interfaces_dir = config.interfaces_dir();
    match cmd {
        Command::Reference(args) => sync.run_reference(&csv_dir, &args.only).await,
        Command::Interfaces(args) => sync.run_interfaces(&interfaces_dir, &args.devices).await,
        Command::Ips(args) => sync.run_addresses(&interfaces_dir, &args.devices).await,
        Command::All => {
            sync.run_reference(&csv_dir, &[]).await;
            sync.run_interfaces(&interfaces_dir, &[]).await;
            sync.run_addresses(&interfaces_dir, &[]).await;
        }
        // Handled before connecting
        Command::Kinds | Command::Completions(_) => {}
    }
}

/// Load the config file and environment, then apply CLI flag overrides.
fn build_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = nbsync_config::load_config(global.config.as_deref())?;

    if let Some(ref url) = global.url {
        config.url.clone_from(url);
    }
    if let Some(ref dir) = global.data_dir {
        config.data_dir.clone_from(dir);
    }
    if let Some(ref dir) = global.log_dir {
        config.log_dir.clone_from(dir);
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }
    if global.insecure {
        config.insecure = true;
    }

    config.base_url()?;
    Ok(config)
}

/// Build the client and probe `/api/status/`; nothing is synced if this fails.
async fn connect(global: &GlobalOpts, config: &Config) -> Result<NetBoxClient, CliError> {
    let token = match global.token.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(token) => SecretString::from(token.to_owned()),
        None => config.resolve_token()?,
    };

    let client = NetBoxClient::new(&config.url, &token, &config.transport())
        .map_err(|err| CliError::from_probe(&config.url, err))?;

    let status = client
        .status()
        .await
        .map_err(|err| CliError::from_probe(&config.url, err))?;
    tracing::info!(
        url = %client.base_url(),
        version = status.get("netbox-version").and_then(|v| v.as_str()).unwrap_or("unknown"),
        "connected to NetBox"
    );

    Ok(client)
}
