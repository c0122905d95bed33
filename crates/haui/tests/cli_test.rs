//! Integration tests for the `haui` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a hub; REST-backed commands run against a wiremock hub.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `haui` binary with env isolation.
///
/// Clears all `HAUI_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn haui_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("haui");
    cmd.env("HOME", "/tmp/haui-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/haui-cli-test-nonexistent")
        .env_remove("HAUI_PROFILE")
        .env_remove("HAUI_HUB")
        .env_remove("HAUI_TOKEN")
        .env_remove("HAUI_OUTPUT")
        .env_remove("HAUI_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async test thread.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || haui_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(hub: &str, rest: &[&str]) -> Vec<String> {
    let mut v = vec![
        "--hub".to_owned(),
        hub.to_owned(),
        "--token".to_owned(),
        "cli-token".to_owned(),
    ];
    v.extend(rest.iter().map(|s| (*s).to_owned()));
    v
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = haui_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    haui_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("states")
            .and(predicate::str::contains("call"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("history")),
    );
}

#[test]
fn test_version_flag() {
    haui_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("haui"));
}

#[test]
fn test_completions_zsh() {
    haui_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_config_subcommands_exist() {
    haui_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("path"))
                .and(predicate::str::contains("set-token")),
        );
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` renders the default config when no file exists.
    haui_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("debounce_ms = 300"));
}

#[test]
fn test_config_path_prints_toml_location() {
    haui_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_states_without_config() {
    haui_cmd()
        .arg("states")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn test_invalid_output_format() {
    let output = haui_cmd()
        .args(["--output", "invalid", "states"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_bad_entity_id_is_usage_error() {
    haui_cmd()
        .args(["--hub", "http://127.0.0.1:9", "--token", "t", "get", "kitchen"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("entity_id"));
}

#[test]
fn test_call_rejects_non_object_data() {
    haui_cmd()
        .args([
            "--hub",
            "http://127.0.0.1:9",
            "--token",
            "t",
            "call",
            "light",
            "turn_on",
            "light.kitchen",
            "--data",
            "[1,2]",
        ])
        .assert()
        .code(2);
}

#[test]
fn test_unreachable_hub_is_connection_error() {
    haui_cmd()
        .args(["--hub", "http://127.0.0.1:9", "--token", "t", "--timeout", "5", "states"])
        .assert()
        .code(7);
}

// ── REST-backed commands ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_get_renders_entity_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/light.kitchen"))
        .and(header("authorization", "Bearer cli-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": "light.kitchen",
            "state": "on",
            "attributes": { "brightness": 200, "friendly_name": "Kitchen" }
        })))
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["-o", "json", "get", "light.kitchen"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["state"], "on");
    assert_eq!(value["attributes"]["brightness"], 200);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_entity_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/sensor.ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Entity not found."
        })))
        .mount(&server)
        .await;

    let output = run(args(&server.uri(), &["get", "sensor.ghost"])).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_plain_lists_points() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/sensor.outdoor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": "sensor.outdoor",
            "state": "12.5",
            "attributes": { "unit_of_measurement": "°C" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/history/period/2024-06-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            { "state": "11.0", "last_changed": "2024-06-01T01:00:00+00:00" },
            { "state": "unavailable", "last_changed": "2024-06-01T02:00:00+00:00" },
            { "state": "12.5", "last_changed": "2024-06-01T03:00:00+00:00" }
        ]])))
        .mount(&server)
        .await;

    let output = run(args(
        &server.uri(),
        &[
            "-o",
            "plain",
            "history",
            "sensor.outdoor",
            "--start",
            "2024-06-01T00:00:00Z",
            "--end",
            "2024-06-01T06:00:00Z",
        ],
    ))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected output:\n{stdout}");
    assert!(lines[0].ends_with(" 11"));
    assert!(lines[1].ends_with(" 12.5"));
}
