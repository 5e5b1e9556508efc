//! Output formatting: table, JSON, YAML.
//!
//! Renders the run summary and the kind listing in the format selected by
//! `--output`. Table uses `tabled`, structured formats use serde.

use std::io::{self, Write};

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::{Table, Tabled, settings::Style};

use nbsync_core::{Kind, SyncReport, Tally};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Updated")]
    updated: usize,
    #[tabled(rename = "Unchanged")]
    unchanged: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
}

impl SummaryRow {
    fn new(kind: String, tally: &Tally) -> Self {
        Self {
            kind,
            created: tally.created,
            updated: tally.updated,
            unchanged: tally.unchanged,
            skipped: tally.skipped,
            failed: tally.failed,
        }
    }
}

#[derive(Tabled, Serialize)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Declared in")]
    source: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render the per-kind summary of a run, with a totals row in table mode.
pub fn render_report(format: OutputFormat, report: &SyncReport) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            if report.is_empty() {
                return Ok("Nothing to sync.".into());
            }
            let mut rows: Vec<SummaryRow> = report
                .rows()
                .map(|(kind, tally)| SummaryRow::new(kind.to_string(), tally))
                .collect();
            rows.push(SummaryRow::new("total".into(), &report.totals()));
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(report),
        OutputFormat::Yaml => render_yaml(report),
    }
}

/// Render every kind with its declaration source and remote collection.
pub fn render_kinds(format: OutputFormat) -> Result<String, CliError> {
    let rows: Vec<KindRow> = Kind::iter()
        .map(|kind| KindRow {
            kind: kind.to_string(),
            source: kind
                .csv_file()
                .map_or_else(|| "<device>_interfaces.yaml".into(), str::to_owned),
            endpoint: kind.endpoint().path(),
        })
        .collect();

    match format {
        OutputFormat::Table => Ok(render_table(&rows)),
        OutputFormat::Json => render_json(&rows),
        OutputFormat::Yaml => render_yaml(&rows),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(data).map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nbsync_core::Outcome;

    fn sample() -> SyncReport {
        let mut report = SyncReport::new();
        report.record(Kind::Site, Outcome::Created);
        report.record(Kind::Device, Outcome::Unchanged);
        report.skip(Kind::Device);
        report
    }

    #[test]
    fn table_has_a_totals_row() {
        let table = render_report(OutputFormat::Table, &sample()).unwrap();
        assert!(table.contains("site"));
        assert!(table.contains("device"));
        assert!(table.contains("total"));
        assert!(table.contains("Unchanged"));
    }

    #[test]
    fn json_is_keyed_by_kind() {
        let json = render_report(OutputFormat::Json, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["device"]["skipped"], 1);
        assert_eq!(value["site"]["created"], 1);
        assert!(value.get("total").is_none());
    }

    #[test]
    fn empty_report_table_says_so() {
        let table = render_report(OutputFormat::Table, &SyncReport::new()).unwrap();
        assert_eq!(table, "Nothing to sync.");
    }

    #[test]
    fn kinds_listing_names_files_and_endpoints() {
        let yaml = render_kinds(OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("device_roles.csv"));
        assert!(yaml.contains("dcim/device-roles/"));
        assert!(yaml.contains("<device>_interfaces.yaml"));
    }
}
