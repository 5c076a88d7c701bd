//! CLI argument validation tests.
//!
//! These tests verify that the CLI properly validates arguments and input
//! documents and reports helpful error messages.

use predicates::prelude::*;

use super::helpers::{fixture_path, perps_cmd, perps_cmd_with_data};

#[test]
fn test_help_output() {
    perps_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("perps-query"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("count"))
        .stdout(predicate::str::contains("sql"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn test_query_help_lists_env_fallbacks() {
    perps_cmd()
        .args(["query", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PERPS_QUERY_MAX_PAGE_SIZE"))
        .stdout(predicate::str::contains("PERPS_QUERY_CLAMP"))
        .stdout(predicate::str::contains("PERPS_QUERY_TIMEOUT_MS"));
}

#[test]
fn test_invalid_command() {
    perps_cmd()
        .arg("invalid_command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_query_missing_entity() {
    perps_cmd_with_data()
        .arg("query")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_query_missing_data() {
    perps_cmd()
        .args(["query", "-e", "Position"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data"));
}

#[test]
fn test_data_flag_overrides_env() {
    perps_cmd()
        .env("PERPS_QUERY_DATA", "/nonexistent/dataset.json")
        .args(["count", "-e", "Market", "--data", fixture_path("perps").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::diff("3\n"));
}

#[test]
fn test_missing_dataset_file() {
    perps_cmd()
        .args(["count", "-e", "Market", "--data", "/nonexistent/dataset.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read dataset"));
}

#[test]
fn test_invalid_format() {
    perps_cmd_with_data()
        .args(["count", "-e", "Market", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_where_must_be_json() {
    perps_cmd_with_data()
        .args(["query", "-e", "Position", "-w", "isLong = true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--where is not a valid JSON object"));
}

#[test]
fn test_unknown_entity() {
    perps_cmd_with_data()
        .args(["query", "-e", "Vault"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown entity: Vault"));
}

#[test]
fn test_invalid_order_token() {
    perps_cmd_with_data()
        .args(["query", "-e", "Position", "-o", "sizeInUsd_SIDEWAYS"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid order token"));
}

#[test]
fn test_unsupported_operator() {
    perps_cmd_with_data()
        .args(["query", "-e", "Position", "-w", r#"{"isLong_gt": true}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not supported on field 'isLong'"));
}

#[test]
fn test_unknown_enum_value() {
    perps_cmd_with_data()
        .args(["count", "-e", "Order", "-w", r#"{"status_eq": "PENDING"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown value 'PENDING'"));
}
