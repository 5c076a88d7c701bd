//! Integration tests for the query, list and count commands.

use predicates::prelude::*;

use super::helpers::{json_output, node_ids, perps_cmd_with_data};

#[test]
fn test_query_walks_pages_with_end_cursor() {
    let first = json_output(perps_cmd_with_data().args([
        "query", "-e", "Position", "-o", "openedAt_ASC", "-n", "2", "--format", "json",
    ]));
    assert_eq!(node_ids(&first), ["p3", "p4"]);
    assert_eq!(first["totalCount"], 6);
    assert_eq!(first["pageInfo"]["hasNextPage"], true);
    assert_eq!(first["pageInfo"]["hasPreviousPage"], false);

    let cursor = first["pageInfo"]["endCursor"].as_str().unwrap().to_string();
    let second = json_output(perps_cmd_with_data().args([
        "query", "-e", "Position", "-o", "openedAt_ASC", "-n", "2", "--after", cursor.as_str(),
        "--format", "json",
    ]));
    assert_eq!(node_ids(&second), ["p1", "p2"]);
    assert_eq!(second["pageInfo"]["hasPreviousPage"], true);

    let cursor = second["pageInfo"]["endCursor"].as_str().unwrap().to_string();
    let last = json_output(perps_cmd_with_data().args([
        "query", "-e", "Position", "-o", "openedAt_ASC", "-n", "2", "--after", cursor.as_str(),
        "--format", "json",
    ]));
    assert_eq!(node_ids(&last), ["p5", "p6"]);
    assert_eq!(last["pageInfo"]["hasNextPage"], false);
    assert_eq!(last["totalCount"], 6);
}

#[test]
fn test_query_table_output() {
    perps_cmd_with_data()
        .args(["query", "-e", "Market", "-o", "id_ASC"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ETH/USD"))
        .stdout(predicate::str::contains("DOGE/USD"))
        .stdout(predicate::str::contains("3 of 3"))
        .stdout(predicate::str::contains("Has next:      No"));
}

#[test]
fn test_query_with_relation_filter() {
    let page = json_output(perps_cmd_with_data().args([
        "query",
        "-e",
        "Position",
        "-w",
        r#"{"trades_some": {"event_eq": "LIQUIDATION"}}"#,
        "-o",
        "id_ASC",
        "--format",
        "json",
    ]));
    assert_eq!(node_ids(&page), ["p4"]);
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["edges"][0]["node"]["status"], "LIQUIDATED");
}

#[test]
fn test_query_big_amounts_stay_exact() {
    let page = json_output(perps_cmd_with_data().args([
        "query",
        "-e",
        "Position",
        "-w",
        r#"{"sizeInUsd_gt": "9999999999999999999"}"#,
        "-o",
        "sizeInUsd_ASC",
        "--format",
        "json",
    ]));
    assert_eq!(node_ids(&page), ["p6", "p1", "p2"]);
    assert_eq!(page["edges"][0]["node"]["sizeInUsd"], "10000000000000000000");
}

#[test]
fn test_query_empty_result() {
    perps_cmd_with_data()
        .args([
            "query",
            "-e",
            "Trade",
            "-w",
            r#"{"account_eq": "0xnobody"}"#,
            "-o",
            "timestamp_DESC",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No Trade rows found."))
        .stdout(predicate::str::contains("0 of 0"));
}

#[test]
fn test_query_clamps_page_size_from_env() {
    let mut cmd = perps_cmd_with_data();
    cmd.env("PERPS_QUERY_MAX_PAGE_SIZE", "3")
        .env("PERPS_QUERY_CLAMP", "true")
        .args(["query", "-e", "Position", "-o", "id_ASC", "-n", "10", "--format", "json"]);

    let page = json_output(&mut cmd);
    assert_eq!(node_ids(&page), ["p1", "p2", "p3"]);
    assert_eq!(page["clampedFrom"], 10);

    cmd.assert()
        .stderr(predicate::str::contains("page size clamped"));
}

#[test]
fn test_query_rejects_oversized_page() {
    perps_cmd_with_data()
        .args(["query", "-e", "Position", "-o", "id_ASC", "-n", "10", "--max-page-size", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds maximum of 3"));
}

#[test]
fn test_query_rejects_non_positive_page() {
    perps_cmd_with_data()
        .args(["query", "-e", "Position", "-o", "id_ASC", "-n", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid page size"));
}

#[test]
fn test_query_cursor_from_other_ordering_is_stale() {
    let page = json_output(perps_cmd_with_data().args([
        "query", "-e", "Position", "-o", "openedAt_ASC", "-n", "2", "--format", "json",
    ]));
    let cursor = page["pageInfo"]["endCursor"].as_str().unwrap().to_string();

    perps_cmd_with_data()
        .args(["query", "-e", "Position", "-o", "id_ASC", "--after", cursor.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stale cursor"));
}

#[test]
fn test_query_malformed_cursor() {
    perps_cmd_with_data()
        .args(["query", "-e", "Position", "-o", "id_ASC", "--after", "not-a-cursor!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed cursor"));
}

#[test]
fn test_list_with_offset() {
    let rows = json_output(perps_cmd_with_data().args([
        "list", "-e", "Position", "-o", "openedAt_DESC", "-n", "2", "--offset", "1", "--format",
        "json",
    ]));
    assert!(rows.get("clampedFrom").is_none());
    let ids: Vec<&str> = rows["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["p5", "p2"]);
}

#[test]
fn test_list_reports_clamped_limit() {
    let output = json_output(
        perps_cmd_with_data()
            .env("PERPS_QUERY_CLAMP", "true")
            .args([
                "list", "-e", "Position", "-o", "id_ASC", "-n", "10", "--max-page-size", "2",
                "--format", "json",
            ]),
    );
    assert_eq!(output["rows"].as_array().unwrap().len(), 2);
    assert_eq!(output["clampedFrom"], 10);

    perps_cmd_with_data()
        .args([
            "list", "-e", "Position", "-o", "id_ASC", "-n", "10", "--max-page-size", "2",
            "--clamp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clamped from:  10"));
}

#[test]
fn test_query_requires_order_by() {
    perps_cmd_with_data()
        .args(["query", "-e", "Position"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("orderBy for Position must contain at least one key"));
}

#[test]
fn test_list_rejects_negative_offset() {
    perps_cmd_with_data()
        .args(["list", "-e", "Position", "-o", "id_ASC", "--offset", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid offset"));
}

#[test]
fn test_count_table_output() {
    perps_cmd_with_data()
        .args(["count", "-e", "Order", "-w", r#"{"status_eq": "EXECUTED"}"#])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

#[test]
fn test_count_json_output() {
    let output = json_output(perps_cmd_with_data().args([
        "count",
        "-e",
        "Position",
        "-w",
        r#"{"sizeInUsd_isNull": true}"#,
        "--format",
        "json",
    ]));
    assert_eq!(output["entity"], "Position");
    assert_eq!(output["count"], 2);
}
