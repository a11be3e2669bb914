use planview_testing::assertions::{
    assert_count, assert_one_primary_per_test, assert_row_count,
};
use planview_testing::fixtures::{point_id, record, release_plan};
use planview_testing::TestWorld;
use planview_types::TestOutcome;
use predicates::prelude::*;
use serde_json::Value;

fn synced_world() -> TestWorld {
    let world = TestWorld::new().with_plan(&release_plan());
    let result = world.run(&["sync"]).unwrap();
    assert!(result.success(), "sync failed: {}", result.stderr());
    world
}

fn node_path(tree: &Value, title: &str) -> String {
    tree["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|node| node["title"] == title)
        .and_then(|node| node["path"].as_str())
        .map(String::from)
        .unwrap_or_else(|| panic!("no node titled {}", title))
}

#[test]
fn test_sync_reports_counts() {
    let world = TestWorld::new().with_plan(&release_plan());

    let json = world.run_json(&["sync"]).unwrap();

    assert_eq!(json["plan"], "Release 3");
    assert_eq!(json["report"]["suites"], 4);
    assert_eq!(json["report"]["tests"], 6);
    assert_eq!(json["report"]["fetched"], 5);
    assert!(world.cache_file().is_some());
}

#[test]
fn test_second_sync_reuses_cached_results() {
    let world = synced_world();

    let json = world.run_json(&["sync"]).unwrap();

    assert_eq!(json["mode"], "Full");
    assert_eq!(json["report"]["reused"], 5);
    assert_eq!(json["report"]["fetched"], 0);
}

#[test]
fn test_structure_only_sync_fetches_nothing() {
    let world = TestWorld::new().with_plan(&release_plan());

    let json = world.run_json(&["sync", "--structure-only"]).unwrap();
    assert_eq!(json["report"]["points"], 0);

    let tree = world.run_json(&["tree"]).unwrap();
    assert_eq!(tree["nodes"].as_array().unwrap().len(), 10);
    let statuses: Vec<&str> = tree["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["kind"] == "test")
        .filter_map(|n| n["status"].as_str())
        .collect();
    assert!(statuses.iter().all(|s| *s == "never_run"));
}

#[test]
fn test_stats_all_and_latest() {
    let world = synced_world();

    let json = world.run_json(&["stats"]).unwrap();

    assert_count(&json, "all", "total", 6).unwrap();
    assert_count(&json, "all", "passed", 2).unwrap();
    assert_count(&json, "latest", "total", 4).unwrap();
    assert_count(&json, "latest", "failed", 2).unwrap();
    assert_count(&json, "latest", "active", 1).unwrap();
}

#[test]
fn test_stats_for_selected_suite() {
    let world = synced_world();
    let tree = world.run_json(&["tree"]).unwrap();
    let payments = node_path(&tree, "Payments");

    let json = world.run_json(&["stats", "--node", &payments]).unwrap();

    assert_count(&json, "selected", "total", 2).unwrap();
    assert_count(&json, "selected", "failed", 1).unwrap();
    assert_count(&json, "selected", "active", 1).unwrap();
}

#[test]
fn test_results_list_one_primary_per_test() {
    let world = synced_world();

    let json = world.run_json(&["results"]).unwrap();

    assert_row_count(&json, 6).unwrap();
    assert_one_primary_per_test(&json).unwrap();
    let shared_primary = json["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["test_id"] == 5 && row["primary"] == true)
        .unwrap();
    assert_eq!(shared_primary["suite_id"], 2);
}

#[test]
fn test_results_sorted_descending() {
    let world = synced_world();

    let json = world
        .run_json(&["results", "--sort", "priority", "--desc"])
        .unwrap();

    assert_eq!(json["sort"]["column"], "priority");
    assert_eq!(json["sort"]["order"], "descending");
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.last().unwrap()["test_id"], 10);
}

#[test]
fn test_results_rejects_unknown_column() {
    let world = synced_world();

    let result = world.run(&["results", "--sort", "colour"]).unwrap();

    assert!(!result.success());
    assert!(predicate::str::contains("Unknown column").eval(result.stderr()));
}

#[test]
fn test_export_writes_tsv_file() {
    let world = synced_world();
    let output = world.temp_dir().join("results.tsv");

    let result = world
        .run(&["export", "--output", output.to_str().unwrap()])
        .unwrap();
    assert!(result.success(), "{}", result.stderr());
    assert!(predicate::str::contains("Exported 6 rows").eval(result.stdout()));

    let text = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("Outcome\tName\tArea\tIsAutomated\tCurrentlyExists\tID"));
}

#[test]
fn test_export_csv_for_node() {
    let world = synced_world();
    let tree = world.run_json(&["tree"]).unwrap();
    let login = node_path(&tree, "Login");
    let output = world.temp_dir().join("login.csv");

    let result = world
        .run(&[
            "export",
            "--output",
            output.to_str().unwrap(),
            "--node",
            &login,
            "--delimiter",
            "csv",
        ])
        .unwrap();
    assert!(result.success(), "{}", result.stderr());

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("Outcome,Name,Area"));
}

#[test]
fn test_refresh_fetches_new_result() {
    let world = synced_world();
    world
        .update_plan(|plan| {
            let id = point_id(plan, 2, 11, "").unwrap();
            plan.record_result(id, record(TestOutcome::Failed, 900, 20, ""));
        })
        .unwrap();
    let tree = world.run_json(&["tree"]).unwrap();
    let refund = node_path(&tree, "Refund");

    let json = world.run_json(&["refresh", "--node", &refund]).unwrap();
    assert_eq!(json["refresh"]["kind"], "updated");
    assert_eq!(json["refresh"]["fetched"], 1);

    let stats = world.run_json(&["stats"]).unwrap();
    assert_count(&stats, "all", "failed", 3).unwrap();
    assert_count(&stats, "all", "active", 0).unwrap();
}

#[test]
fn test_refresh_prunes_removed_test() {
    let world = synced_world();
    world
        .update_plan(|plan| {
            let id = point_id(plan, 3, 12, "").unwrap();
            plan.remove_point(id);
        })
        .unwrap();
    let tree = world.run_json(&["tree"]).unwrap();
    let token = node_path(&tree, "Token refresh");

    let json = world.run_json(&["refresh", "--node", &token]).unwrap();
    assert_eq!(json["refresh"]["kind"], "removed");
    assert_eq!(json["refresh"]["parent_removed"], true);

    let tree = world.run_json(&["tree"]).unwrap();
    let titles: Vec<&str> = tree["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["title"].as_str())
        .collect();
    assert!(!titles.contains(&"Token refresh"));
    assert!(!titles.contains(&"OAuth"));
}

#[test]
fn test_refresh_rejects_bad_path() {
    let world = synced_world();

    let result = world.run(&["refresh", "--node", "0/x"]).unwrap();

    assert!(!result.success());
    assert!(predicate::str::contains("Invalid node path").eval(result.stderr()));
}

#[test]
fn test_seed_cache_restores_missing_working_cache() {
    let world = synced_world();
    world.promote_cache_to_seed(1_700_000_000).unwrap();
    std::fs::remove_file(world.cache_file().unwrap()).unwrap();

    let tree = world.run_json(&["tree"]).unwrap();

    assert_eq!(tree["nodes"].as_array().unwrap().len(), 10);
    assert!(world.cache_file().is_some());
}

#[test]
fn test_tree_plain_output() {
    let world = synced_world();

    let result = world.run(&["tree"]).unwrap();

    assert!(result.success());
    assert!(predicate::str::contains("Sign in [Linux]").eval(result.stdout()));
    assert!(predicate::str::contains("Last updated").eval(result.stdout()));
}

#[test]
fn test_tree_before_sync() {
    let world = TestWorld::new().with_plan(&release_plan());

    let result = world.run(&["tree"]).unwrap();

    assert!(result.success());
    assert!(predicate::str::contains("Run `planview sync` first").eval(result.stdout()));
}

#[test]
fn test_missing_snapshot_is_connection_error() {
    let world = TestWorld::new();

    let result = world.run(&["sync"]).unwrap();

    assert!(!result.success());
    assert!(predicate::str::contains("snapshot not found").eval(result.stderr()));
}
