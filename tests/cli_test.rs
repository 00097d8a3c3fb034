mod common;

use std::fs;

use common::KqTest;
use serde_json::Value;

fn json(stdout: &str) -> Value {
    serde_json::from_str(stdout).expect("command should print valid JSON")
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_set_then_show() {
    let kq = KqTest::new();
    kq.run_success(&["config", "set", "server", "https://acme.kinops.io"]);
    kq.run_success(&["config", "set", "username", "alice"]);
    kq.run_success(&["config", "set", "all_teams", "IT,HR"]);

    assert!(kq.config_path().exists());

    let shown = json(&kq.run_success(&["config", "show", "--json"]));
    assert_eq!(shown["settings"]["server"], "https://acme.kinops.io");
    assert_eq!(shown["settings"]["username"], "alice");
    assert_eq!(shown["settings"]["all_teams"], "IT, HR");
    assert_eq!(shown["settings"]["password"], "(not set)");
    assert_eq!(shown["env_overrides"], serde_json::json!([]));
}

#[test]
fn test_config_set_password_is_not_echoed() {
    let kq = KqTest::new();
    let stdout = kq.run_success(&["config", "set", "password", "hunter2", "--json"]);
    let result = json(&stdout);
    assert_eq!(result["success"], true);
    assert!(result.get("value").is_none());

    let shown = kq.run_success(&["config", "show"]);
    assert!(!shown.contains("hunter2"));
    assert!(shown.contains("********"));
    assert!(
        fs::read_to_string(kq.config_path())
            .unwrap()
            .contains("hunter2")
    );
}

#[test]
fn test_config_set_rejects_bad_values() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["config", "set", "page_size", "30"]);
    assert!(stderr.contains("invalid page size 30"));

    let stderr = kq.run_failure(&["config", "set", "colour", "blue"]);
    assert!(stderr.contains("unknown config key 'colour'"));
    assert!(!kq.config_path().exists());
}

#[test]
fn test_config_show_reports_environment_overrides() {
    let kq = KqTest::new();
    let output = kq
        .command()
        .args(["config", "show", "--json"])
        .env("KQ_SERVER", "https://env.example.com")
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown = json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(shown["env_overrides"], serde_json::json!(["KQ_SERVER"]));
}

// ============================================================================
// Query (offline)
// ============================================================================

#[test]
fn test_query_unassigned_for_my_teams() {
    let kq = KqTest::new();
    kq.run_success(&["config", "set", "username", "alice"]);

    let stdout = kq.run_success(&[
        "query",
        "-f",
        "Unassigned",
        "--member-of",
        "IT",
        "--member-of",
        "HR",
        "--json",
    ]);
    let result = json(&stdout);
    assert_eq!(result["kapp"], "queue");
    assert_eq!(result["invalid_assignment"], false);
    assert_eq!(
        result["search"]["q"],
        r#"values[Assigned Individual] = null AND values[Assigned Team] IN ("IT", "HR") AND values[Status] = "Open""#
    );
    assert_eq!(
        result["search"]["include"],
        serde_json::json!(["details", "form", "form.kapp", "values"])
    );
}

#[test]
fn test_query_defaults_to_mine() {
    let kq = KqTest::new();
    kq.run_success(&["config", "set", "username", "alice"]);

    let result = json(&kq.run_success(&["query", "--json"]));
    assert_eq!(result["filter"]["name"], "Mine");
    assert_eq!(
        result["search"]["q"],
        r#"values[Assigned Individual] = "alice" AND values[Status] = "Open""#
    );
}

#[test]
fn test_query_with_criteria_runs_adhoc() {
    let kq = KqTest::new();
    kq.run_success(&["config", "set", "username", "alice"]);

    let result = json(&kq.run_success(&[
        "query",
        "--mine",
        "--status",
        "Complete",
        "--timeline",
        "closedAt",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-31",
        "--json",
    ]));
    assert_eq!(result["filter"]["type"], "adhoc");
    assert_eq!(result["search"]["orderBy"], "closedAt");
    assert_eq!(
        result["search"]["q"],
        r#"values[Assigned Individual] = "alice" AND values[Status] = "Complete" AND closedAt BETWEEN ("2024-01-01T00:00:00Z", "2024-02-01T00:00:00Z")"#
    );
}

#[test]
fn test_query_closed_status_requires_date_range() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["query", "--mine", "--status", "Complete"]);
    assert!(stderr.contains("A date range is required"));
}

#[test]
fn test_query_requires_assignment_constraint() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["query", "--status", "Open"]);
    assert!(stderr.contains("Select an assignment or created by me"));
}

#[test]
fn test_query_sort_conflicts_with_date_range() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["query", "--mine", "--preset", "7days", "--sort", "dueDate"]);
    assert!(stderr.contains("cannot be used with"));
}

#[test]
fn test_query_repeated_team_keeps_the_team() {
    let kq = KqTest::new();
    let result = json(&kq.run_success(&[
        "query",
        "--team",
        "IT",
        "--team",
        "IT",
        "--member-of",
        "IT",
        "--json",
    ]));
    assert_eq!(result["filter"]["teams"], serde_json::json!(["IT"]));
    assert_eq!(result["search"]["q"], r#"values[Assigned Team] IN ("IT")"#);
}

#[test]
fn test_query_unknown_filter() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["query", "-f", "Nope"]);
    assert!(stderr.contains("filter 'Nope' not found"));
}

#[test]
fn test_invalid_status_is_rejected_by_the_parser() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["query", "--mine", "--status", "Closed"]);
    assert!(stderr.contains("Invalid status"));
    assert!(stderr.contains("Open, Pending, Cancelled, Complete"));
}

#[test]
fn test_invalid_limit_is_rejected_by_the_parser() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["list", "--limit", "7"]);
    assert!(stderr.contains("10, 25, 50, 100"));
}

// ============================================================================
// Commands needing a server
// ============================================================================

#[test]
fn test_list_without_server_fails() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["list"]);
    assert!(stderr.contains("server not configured"));
}

#[test]
fn test_show_without_credentials_fails() {
    let kq = KqTest::new();
    kq.run_success(&["config", "set", "server", "https://acme.kinops.io"]);
    let stderr = kq.run_failure(&["show", "abc-123"]);
    assert!(stderr.contains("username not configured"));
}

#[test]
fn test_work_requires_field_values() {
    let kq = KqTest::new();
    let stderr = kq.run_failure(&["work", "abc-123"]);
    assert!(stderr.contains("--set"));
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn test_bash_completions() {
    let kq = KqTest::new();
    let stdout = kq.run_success(&["completions", "bash"]);
    assert!(stdout.contains("_kq"));
    assert!(stdout.contains("filters"));
}
