//! Integration tests for the plan cache file
//!
//! These tests verify that a saved tree reloads unchanged and that anything
//! unreadable is reported as a cache miss.

use chrono::{TimeZone, Utc};
use planview_index::{PlanCache, SCHEMA_VERSION};
use planview_types::{NodeStatus, PlanTree, PointState, ResultEntity, TestOutcome, TreeNode};
use rusqlite::Connection;
use tempfile::TempDir;

fn sample_tree() -> PlanTree {
    let mut passed = ResultEntity::new("Login", 2, 20, "Auth", "Windows");
    passed.outcome = TestOutcome::Passed;
    passed.state = PointState::Completed;
    passed.most_recent_run_id = 41;
    passed.completed = Some(Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap());
    passed.historic_outcomes = vec![TestOutcome::Passed, TestOutcome::Failed];

    let mut root = TreeNode::suite("Release", 1, "Release");
    let mut auth = TreeNode::suite("Auth", 2, "Auth");
    auth.children.push(TreeNode::test("Login", passed));
    auth.children
        .push(TreeNode::test("Logout", ResultEntity::new("Logout", 2, 21, "Auth", "")));
    root.children.push(auth);
    root.children
        .push(TreeNode::test("Smoke", ResultEntity::new("Smoke", 1, 10, "Release", "")));

    PlanTree {
        plan_name: "Release".to_string(),
        roots: vec![root],
        last_updated: Some(Utc.with_ymd_and_hms(2024, 2, 2, 8, 0, 0).unwrap()),
    }
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = PlanCache::new(dir.path().join("nested/plan.planview.db"));
    let tree = sample_tree();

    cache.save(&tree).unwrap();
    let loaded = cache.load().expect("cache should load");

    assert_eq!(loaded, tree);
    let login = &loaded.roots[0].children[0].children[0];
    assert_eq!(login.status, NodeStatus::Passed);
    assert_eq!(loaded.roots[0].status, NodeStatus::Folder);
}

#[test]
fn test_save_overwrites_previous_contents() {
    let dir = TempDir::new().unwrap();
    let cache = PlanCache::new(dir.path().join("plan.planview.db"));

    cache.save(&sample_tree()).unwrap();
    let smaller = PlanTree {
        plan_name: "Release".to_string(),
        roots: vec![TreeNode::suite("Release", 1, "Release")],
        last_updated: None,
    };
    cache.save(&smaller).unwrap();

    let loaded = cache.load().unwrap();
    assert_eq!(loaded.node_count(), 1);
    // Falls back to the file's modification time.
    assert!(loaded.last_updated.is_some());
}

#[test]
fn test_missing_file_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = PlanCache::new(dir.path().join("absent.planview.db"));
    assert!(cache.try_load().unwrap().is_none());
    assert!(cache.load().is_none());
}

#[test]
fn test_garbage_file_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.planview.db");
    std::fs::write(&path, b"definitely not sqlite, just some bytes in a file").unwrap();

    let cache = PlanCache::new(&path);
    assert!(cache.try_load().is_err());
    assert!(cache.load().is_none());

    // A later save replaces the garbage.
    cache.save(&sample_tree()).unwrap();
    assert!(cache.load().is_some());
}

#[test]
fn test_version_mismatch_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.planview.db");
    let cache = PlanCache::new(&path);
    cache.save(&sample_tree()).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 1), [])
        .unwrap();
    drop(conn);

    assert!(cache.try_load().unwrap().is_none());
}

#[test]
fn test_corrupt_entity_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plan.planview.db");
    let cache = PlanCache::new(&path);
    cache.save(&sample_tree()).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE nodes SET entity = '{not json' WHERE kind = 'test'", [])
        .unwrap();
    drop(conn);

    assert!(cache.load().is_none());
}
