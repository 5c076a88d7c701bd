//! Test helper utilities for CLI integration tests.

#![allow(deprecated)] // Command::cargo_bin deprecation

use assert_cmd::Command;
use serde_json::Value;

/// Path of a fixture dataset.
pub fn fixture_path(name: &str) -> String {
    format!(
        "{}/tests/fixtures/{}.json",
        env!("CARGO_MANIFEST_DIR"),
        name
    )
}

/// Create a CLI command with a clean configuration environment.
pub fn perps_cmd() -> Command {
    let mut cmd = Command::cargo_bin("perps-query").unwrap();
    cmd.env_remove("PERPS_QUERY_DATA")
        .env_remove("PERPS_QUERY_MAX_PAGE_SIZE")
        .env_remove("PERPS_QUERY_CLAMP")
        .env_remove("PERPS_QUERY_TIMEOUT_MS")
        .env_remove("RUST_LOG");
    cmd
}

/// Create a CLI command reading the `perps` fixture.
pub fn perps_cmd_with_data() -> Command {
    let mut cmd = perps_cmd();
    cmd.env("PERPS_QUERY_DATA", fixture_path("perps"));
    cmd
}

/// Run a command that must succeed and parse its stdout as JSON.
pub fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap_or_else(|e| panic!("stdout is not JSON: {}", e))
}

/// Ids of the nodes in a JSON connection.
pub fn node_ids(page: &Value) -> Vec<String> {
    page["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| edge["node"]["id"].as_str().unwrap().to_string())
        .collect()
}
