//! Integration tests for the sql and schema commands.

use predicates::prelude::*;

use super::helpers::{json_output, node_ids, perps_cmd, perps_cmd_with_data};

#[test]
fn test_sql_json_output() {
    let output = json_output(perps_cmd().args([
        "sql",
        "-e",
        "Position",
        "-w",
        r#"{"status_eq": "OPEN"}"#,
        "-o",
        "sizeInUsd_DESC",
        "--format",
        "json",
    ]));
    assert_eq!(
        output["sql"],
        concat!(
            r#"SELECT "t0".* FROM "Position" AS "t0" WHERE "t0"."status" = $1"#,
            r#" ORDER BY "t0"."sizeInUsd" DESC NULLS FIRST, "t0"."id" ASC NULLS LAST LIMIT 26"#
        )
    );
    assert_eq!(output["params"], serde_json::json!(["OPEN"]));
}

#[test]
fn test_sql_count_table_output() {
    perps_cmd()
        .args(["sql", "-e", "Trade", "-w", r#"{"pnlUsd_isNull": true}"#, "--count"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"SELECT count(*) FROM "Trade" AS "t0" WHERE "t0"."pnlUsd" IS NULL"#,
        ))
        .stdout(predicate::str::contains("Parameters").not());
}

#[test]
fn test_sql_resumes_after_cursor() {
    let page = json_output(perps_cmd_with_data().args([
        "query", "-e", "Trade", "-o", "timestamp_DESC", "-n", "1", "--format", "json",
    ]));
    let last_id = node_ids(&page).pop().unwrap();
    let cursor = page["pageInfo"]["endCursor"].as_str().unwrap().to_string();

    let output = json_output(perps_cmd().args([
        "sql",
        "-e",
        "Trade",
        "-o",
        "timestamp_DESC",
        "-n",
        "1",
        "--after",
        cursor.as_str(),
        "--format",
        "json",
    ]));
    let sql = output["sql"].as_str().unwrap();
    assert!(sql.contains(r#""t0"."timestamp" < $1"#));
    assert!(sql.ends_with("LIMIT 2"));
    assert_eq!(output["params"][2], serde_json::json!(last_id));
}

#[test]
fn test_sql_rejects_unknown_field() {
    perps_cmd()
        .args(["sql", "-e", "Trade", "-w", r#"{"leverage_gt": "2"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field 'leverage' on Trade"));
}

#[test]
fn test_schema_single_entity() {
    perps_cmd()
        .args(["schema", "Position"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Position"))
        .stdout(predicate::str::contains("sizeInUsd"))
        .stdout(predicate::str::contains("-> Trade.position"))
        .stdout(predicate::str::contains("Market\n").not());
}

#[test]
fn test_schema_json_lists_every_entity() {
    let output = json_output(perps_cmd().args(["schema", "--format", "json"]));
    let mut names: Vec<&str> = output
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(names, ["Market", "Order", "Position", "Trade"]);
}

#[test]
fn test_schema_unknown_entity() {
    perps_cmd()
        .args(["schema", "Vault"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown entity: Vault"));
}
