//! Integration tests for the `nbsync` CLI binary.
//!
//! Argument parsing, local commands, startup failures and exit codes, plus
//! one end-to-end reference run against a mocked NetBox.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `nbsync` binary with env isolation.
///
/// Clears the token and every `NBSYNC_*` override, and points config
/// directories at a nonexistent path so tests never read a real config.
fn nbsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("nbsync");
    cmd.env("HOME", "/tmp/nbsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/nbsync-cli-test-nonexistent")
        .env_remove("NETBOX_TOKEN")
        .env_remove("NBSYNC_CONFIG")
        .env_remove("NBSYNC_URL")
        .env_remove("NBSYNC_TOKEN")
        .env_remove("NBSYNC_TOKEN_ENV")
        .env_remove("NBSYNC_DATA_DIR")
        .env_remove("NBSYNC_CSV_DIR")
        .env_remove("NBSYNC_INTERFACES_DIR")
        .env_remove("NBSYNC_LOG_DIR")
        .env_remove("NBSYNC_INSECURE")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn page(results: serde_json::Value) -> serde_json::Value {
    let count = results.as_array().map_or(0, Vec::len);
    json!({ "count": count, "next": null, "previous": null, "results": results })
}

async fn netbox() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"netbox-version": "4.1.0"})))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = nbsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    nbsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("NetBox")
            .and(predicate::str::contains("reference"))
            .and(predicate::str::contains("interfaces"))
            .and(predicate::str::contains("ips")),
    );
}

#[test]
fn test_version_flag() {
    nbsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nbsync"));
}

#[test]
fn test_unknown_kind_is_a_usage_error() {
    nbsync_cmd()
        .args(["reference", "--only", "cable"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cable"));
}

// ── Local commands ──────────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    nbsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_kinds_lists_csv_files_without_a_token() {
    nbsync_cmd().arg("kinds").assert().success().stdout(
        predicate::str::contains("regions.csv")
            .and(predicate::str::contains("prefixes.csv"))
            .and(predicate::str::contains("ipam/ip-addresses/")),
    );
}

// ── Startup failures ────────────────────────────────────────────────

#[test]
fn test_missing_token_exits_with_auth_code() {
    let logs = tempfile::tempdir().unwrap();
    let output = nbsync_cmd()
        .args(["all", "--log-dir"])
        .arg(logs.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("No API token"), "unexpected output:\n{text}");
}

#[test]
fn test_unreachable_netbox_exits_with_connection_code() {
    let logs = tempfile::tempdir().unwrap();
    let output = nbsync_cmd()
        .args(["reference", "--url", "http://127.0.0.1:9", "--token", "t0k3n", "--log-dir"])
        .arg(logs.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    let text = combined_output(&output);
    assert!(text.contains("Could not reach NetBox"), "unexpected output:\n{text}");
}

#[test]
fn test_non_http_url_is_a_usage_error() {
    nbsync_cmd()
        .args(["reference", "--url", "ftp://netbox", "--token", "t0k3n"])
        .assert()
        .code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Invalid token"})))
        .mount(&server)
        .await;
    let logs = tempfile::tempdir().unwrap();

    nbsync_cmd()
        .args(["reference", "--token", "wrong", "--url"])
        .arg(server.uri())
        .arg("--log-dir")
        .arg(logs.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}

// ── End-to-end ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_reference_run_creates_and_reports() {
    let server = netbox().await;
    Mock::given(method("GET"))
        .and(path("/api/dcim/manufacturers/"))
        .and(query_param("name", "Cisco"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dcim/manufacturers/"))
        .and(body_json(json!({"name": "Cisco", "slug": "cisco"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 1, "name": "Cisco", "slug": "cisco"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = tempfile::tempdir().unwrap();
    std::fs::create_dir(data.path().join("csv")).unwrap();
    std::fs::write(data.path().join("csv/manufacturers.csv"), "name,slug\nCisco,cisco\n").unwrap();
    let logs = tempfile::tempdir().unwrap();

    let output = nbsync_cmd()
        .env("NETBOX_TOKEN", "0123456789abcdef")
        .args(["reference", "--output", "json", "--url"])
        .arg(server.uri())
        .arg("--data-dir")
        .arg(data.path())
        .arg("--log-dir")
        .arg(logs.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["manufacturer"]["created"], 1);

    let log = std::fs::read_to_string(logs.path().join("netbox.log")).unwrap();
    assert!(log.contains("Cisco"), "audit log missing the write:\n{log}");
    assert!(log.contains("line=2"), "audit log missing the source row:\n{log}");
    assert!(log.contains("writes=1"), "audit log missing the totals:\n{log}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_data_dir_completes_with_nothing_to_sync() {
    let server = netbox().await;
    let data = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();

    nbsync_cmd()
        .env("NETBOX_TOKEN", "0123456789abcdef")
        .args(["all", "--url"])
        .arg(server.uri())
        .arg("--data-dir")
        .arg(data.path())
        .arg("--log-dir")
        .arg(logs.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync."));
}
