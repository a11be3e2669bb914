use planview_runtime::{CancelToken, Error, NodeRefresh, TreeSynchronizer};
use planview_testing::FakeRemote;
use planview_testing::fixtures::{PlanBuilder, ROOT_SUITE_ID, point_id, record, release_plan};
use planview_types::{NodePath, NodeTag, PlanTree, PointState, ResultEntity, TestOutcome};

fn find_test(
    tree: &PlanTree,
    suite_id: i32,
    test_id: i32,
    configuration: &str,
) -> Option<NodePath> {
    tree.walk().into_iter().find_map(|(path, node)| {
        node.tag
            .as_test()
            .filter(|e| {
                e.suite_id == suite_id && e.test_id == test_id && e.configuration == configuration
            })
            .map(|_| path)
    })
}

fn find_suite(tree: &PlanTree, suite_id: i32) -> Option<NodePath> {
    tree.walk().into_iter().find_map(|(path, node)| match &node.tag {
        NodeTag::Suite(tag) if tag.suite_id == suite_id => Some(path),
        _ => None,
    })
}

fn entity<'a>(
    tree: &'a PlanTree,
    suite_id: i32,
    test_id: i32,
    configuration: &str,
) -> &'a ResultEntity {
    let path = find_test(tree, suite_id, test_id, configuration).expect("test node");
    tree.node(&path).and_then(|n| n.tag.as_test()).expect("test entity")
}

/// One test in the root suite with a single recorded run.
fn single_run_plan(outcome: TestOutcome, run_id: i32) -> FakeRemote {
    FakeRemote::new(
        PlanBuilder::new(1, "P")
            .test(ROOT_SUITE_ID, 1, "Only", &[])
            .result(ROOT_SUITE_ID, 1, "", outcome, run_id, 2)
            .build(),
    )
}

fn synced(remote: &FakeRemote) -> PlanTree {
    let mut tree = PlanTree::default();
    TreeSynchronizer::new(remote)
        .full_refresh(&mut tree)
        .expect("full refresh");
    tree
}

#[test]
fn test_structure_refresh_builds_hierarchy_without_results() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = PlanTree::default();

    let report = TreeSynchronizer::new(&remote)
        .structure_refresh(&mut tree)
        .unwrap();

    assert_eq!(tree.plan_name, "Release 3");
    assert_eq!(tree.roots.len(), 1);
    assert_eq!(tree.roots[0].title, "Release 3");
    assert_eq!(report.suites, 4);
    assert_eq!(report.tests, 6);
    assert_eq!(remote.latest_result_calls(), 0);

    let sign_in = entity(&tree, 1, 10, "Linux");
    assert_eq!(sign_in.outcome, TestOutcome::Unspecified);
    assert_eq!(sign_in.area, "Login");

    let token = entity(&tree, 3, 12, "");
    assert_eq!(token.area, "Login\\OAuth");
}

#[test]
fn test_full_refresh_applies_latest_results() {
    let remote = FakeRemote::new(release_plan());
    let tree = synced(&remote);

    let linux = entity(&tree, 1, 10, "Linux");
    assert_eq!(linux.outcome, TestOutcome::Failed);
    assert_eq!(linux.most_recent_run_id, 102);
    assert_eq!(linux.error_message, "expected 200\nactual 500");
    assert_eq!(linux.priority, 1);
    assert!(linux.is_automated);
    assert!(linux.exists);

    let token = entity(&tree, 3, 12, "");
    assert_eq!(token.outcome, TestOutcome::Blocked);
    assert_eq!(
        token.historic_outcomes,
        vec![TestOutcome::Blocked, TestOutcome::Passed]
    );

    let refund = entity(&tree, 2, 11, "");
    assert_eq!(refund.outcome, TestOutcome::Unspecified);
    assert!(refund.completed.is_none());
    assert_eq!(refund.state, PointState::Ready);
}

#[test]
fn test_same_test_in_two_suites_stays_distinct() {
    let remote = FakeRemote::new(release_plan());
    let tree = synced(&remote);

    let in_login = entity(&tree, 1, 5, "");
    let in_payments = entity(&tree, 2, 5, "");
    assert_eq!(in_login.outcome, TestOutcome::Passed);
    assert_eq!(in_payments.outcome, TestOutcome::Failed);
    assert!(in_payments.completed > in_login.completed);
}

#[test]
fn test_unchanged_run_ids_reuse_cached_entities() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);
    let before = tree.clone();
    remote.reset_calls();

    let report = TreeSynchronizer::new(&remote)
        .full_refresh(&mut tree)
        .unwrap();

    assert_eq!(remote.latest_result_calls(), 1, "only the never-run point is queried");
    assert_eq!(report.reused, 5);
    assert_eq!(report.fetched, 0);
    assert_eq!(tree, before);
}

#[test]
fn test_new_run_is_fetched() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);

    remote.update(|plan| {
        let id = point_id(plan, 2, 11, "").unwrap();
        plan.record_result(id, record(TestOutcome::Passed, 200, 9, ""));
    });
    let report = TreeSynchronizer::new(&remote)
        .full_refresh(&mut tree)
        .unwrap();

    assert_eq!(report.fetched, 1);
    let refund = entity(&tree, 2, 11, "");
    assert_eq!(refund.outcome, TestOutcome::Passed);
    assert_eq!(refund.most_recent_run_id, 200);
    assert_eq!(refund.state, PointState::Completed);
}

#[test]
fn test_pending_result_is_refetched_despite_same_run_id() {
    let remote = single_run_plan(TestOutcome::None, 5);
    let mut tree = synced(&remote);
    remote.reset_calls();

    let report = TreeSynchronizer::new(&remote)
        .full_refresh(&mut tree)
        .unwrap();

    assert_eq!(remote.latest_result_calls(), 1);
    assert_eq!(report.reused, 0);
    assert_eq!(report.fetched, 1);
}

#[test]
fn test_run_id_zero_is_never_reused() {
    let remote = single_run_plan(TestOutcome::Passed, 0);
    let mut tree = synced(&remote);
    remote.reset_calls();

    let report = TreeSynchronizer::new(&remote)
        .full_refresh(&mut tree)
        .unwrap();

    assert_eq!(remote.latest_result_calls(), 1);
    assert_eq!(report.reused, 0);
    assert_eq!(report.fetched, 1);
}

#[test]
fn test_missing_result_refreshes_cached_history() {
    let remote = single_run_plan(TestOutcome::Passed, 7);
    let mut tree = synced(&remote);
    assert_eq!(
        entity(&tree, ROOT_SUITE_ID, 1, "").historic_outcomes,
        vec![TestOutcome::Passed]
    );

    // A new run started but has not reported, and the old results were purged.
    remote.update(|plan| {
        let id = point_id(plan, ROOT_SUITE_ID, 1, "").unwrap();
        plan.results.remove(&id);
        plan.point_mut(id).unwrap().most_recent_run_id = 8;
    });
    remote.reset_calls();
    let report = TreeSynchronizer::new(&remote)
        .full_refresh(&mut tree)
        .unwrap();

    assert_eq!(remote.latest_result_calls(), 1);
    assert_eq!(report.history_refreshed, 1);
    assert_eq!(report.fetched, 0);
    assert_eq!(report.reused, 0);
    let only = entity(&tree, ROOT_SUITE_ID, 1, "");
    assert_eq!(only.outcome, TestOutcome::Passed);
    assert_eq!(only.most_recent_run_id, 7);
    assert!(only.historic_outcomes.is_empty());
}

#[test]
fn test_deleted_test_cases_are_skipped() {
    let plan = PlanBuilder::new(1, "P")
        .test(ROOT_SUITE_ID, 1, "Kept", &[])
        .test(ROOT_SUITE_ID, 2, "Gone", &[])
        .result(ROOT_SUITE_ID, 2, "", TestOutcome::Passed, 5, 1)
        .deleted(2)
        .build();
    let remote = FakeRemote::new(plan);
    let tree = synced(&remote);

    let gone = entity(&tree, ROOT_SUITE_ID, 2, "");
    assert_eq!(gone.outcome, TestOutcome::Unspecified);
}

#[test]
fn test_connection_failure_leaves_tree_untouched() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);
    let before = tree.clone();

    remote.set_offline(true);
    let err = TreeSynchronizer::new(&remote)
        .full_refresh(&mut tree)
        .unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    assert_eq!(tree, before);
}

#[test]
fn test_point_failure_keeps_prior_entity() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);
    let linux_before = entity(&tree, 1, 10, "Linux").clone();

    let linux_point = point_id(&remote.snapshot(), 1, 10, "Linux").unwrap();
    remote.update(|plan| {
        plan.record_result(linux_point, record(TestOutcome::Passed, 300, 10, "Linux"))
    });
    remote.fail_point(linux_point);

    let report = TreeSynchronizer::new(&remote)
        .full_refresh(&mut tree)
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(entity(&tree, 1, 10, "Linux"), &linux_before);
}

#[test]
fn test_cancelled_refresh_returns_cancelled() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = PlanTree::default();
    let token = CancelToken::new();
    token.cancel();

    let err = TreeSynchronizer::new(&remote)
        .with_cancel(token)
        .full_refresh(&mut tree)
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(tree.is_empty());
}

#[test]
fn test_refresh_test_node_fetches_new_result() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);

    remote.update(|plan| {
        let id = point_id(plan, 1, 10, "Windows").unwrap();
        plan.record_result(id, record(TestOutcome::Failed, 400, 12, "Windows"));
    });
    let path = find_test(&tree, 1, 10, "Windows").unwrap();
    let outcome = TreeSynchronizer::new(&remote)
        .refresh_node(&mut tree, &path)
        .unwrap();

    assert_eq!(outcome, NodeRefresh::Updated { fetched: 1, unchanged: 0 });
    let windows = entity(&tree, 1, 10, "Windows");
    assert_eq!(windows.outcome, TestOutcome::Failed);
    assert_eq!(
        windows.historic_outcomes,
        vec![TestOutcome::Failed, TestOutcome::Passed]
    );
}

#[test]
fn test_refresh_node_is_idempotent() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);
    let path = find_test(&tree, 1, 10, "Linux").unwrap();

    let mut sync = TreeSynchronizer::new(&remote);
    sync.refresh_node(&mut tree, &path).unwrap();
    let once = tree.clone();
    remote.reset_calls();
    let outcome = sync.refresh_node(&mut tree, &path).unwrap();

    assert_eq!(outcome, NodeRefresh::Updated { fetched: 0, unchanged: 1 });
    assert_eq!(remote.latest_result_calls(), 0);
    assert_eq!(tree, once);
}

#[test]
fn test_refresh_test_node_with_run_id_zero_fetches() {
    let remote = single_run_plan(TestOutcome::Passed, 0);
    let mut tree = synced(&remote);
    let path = find_test(&tree, ROOT_SUITE_ID, 1, "").unwrap();
    remote.reset_calls();

    let outcome = TreeSynchronizer::new(&remote)
        .refresh_node(&mut tree, &path)
        .unwrap();

    assert_eq!(outcome, NodeRefresh::Updated { fetched: 1, unchanged: 0 });
    assert_eq!(remote.latest_result_calls(), 1);
}

#[test]
fn test_refresh_suite_skips_only_matching_nonzero_run_ids() {
    let remote = FakeRemote::new(
        PlanBuilder::new(1, "P")
            .test(ROOT_SUITE_ID, 1, "Current", &[])
            .test(ROOT_SUITE_ID, 2, "Unnumbered", &[])
            .result(ROOT_SUITE_ID, 1, "", TestOutcome::Passed, 7, 2)
            .result(ROOT_SUITE_ID, 2, "", TestOutcome::Failed, 0, 3)
            .build(),
    );
    let mut tree = synced(&remote);
    let root = find_suite(&tree, ROOT_SUITE_ID).unwrap();
    remote.reset_calls();

    let outcome = TreeSynchronizer::new(&remote)
        .refresh_node(&mut tree, &root)
        .unwrap();

    assert_eq!(outcome, NodeRefresh::Updated { fetched: 1, unchanged: 1 });
    assert_eq!(remote.latest_result_calls(), 1);
}

#[test]
fn test_refresh_suite_updates_direct_tests_only() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);

    remote.update(|plan| {
        let shared = point_id(plan, 1, 5, "").unwrap();
        plan.record_result(shared, record(TestOutcome::Failed, 500, 20, ""));
        let token = point_id(plan, 3, 12, "").unwrap();
        plan.record_result(token, record(TestOutcome::Passed, 501, 20, ""));
    });
    let login = find_suite(&tree, 1).unwrap();
    let outcome = TreeSynchronizer::new(&remote)
        .refresh_node(&mut tree, &login)
        .unwrap();

    assert_eq!(outcome, NodeRefresh::Updated { fetched: 1, unchanged: 2 });
    assert_eq!(entity(&tree, 1, 5, "").outcome, TestOutcome::Failed);
    // Nested suites are not descended into.
    assert_eq!(entity(&tree, 3, 12, "").outcome, TestOutcome::Blocked);
}

#[test]
fn test_refresh_prunes_removed_test_and_empty_parent() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);
    let nodes_before = tree.node_count();

    remote.update(|plan| {
        let id = point_id(plan, 3, 12, "").unwrap();
        plan.remove_point(id);
    });
    let path = find_test(&tree, 3, 12, "").unwrap();
    let outcome = TreeSynchronizer::new(&remote)
        .refresh_node(&mut tree, &path)
        .unwrap();

    assert_eq!(outcome, NodeRefresh::Removed { parent_removed: true });
    assert!(find_test(&tree, 3, 12, "").is_none());
    assert!(find_suite(&tree, 3).is_none());
    assert_eq!(tree.node_count(), nodes_before - 2);
}

#[test]
fn test_refresh_prunes_test_but_keeps_nonempty_parent() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);

    remote.update(|plan| {
        let id = point_id(plan, 2, 11, "").unwrap();
        plan.remove_point(id);
    });
    let path = find_test(&tree, 2, 11, "").unwrap();
    let outcome = TreeSynchronizer::new(&remote)
        .refresh_node(&mut tree, &path)
        .unwrap();

    assert_eq!(outcome, NodeRefresh::Removed { parent_removed: false });
    assert!(find_suite(&tree, 2).is_some());
    assert!(find_test(&tree, 2, 5, "").is_some());
}

#[test]
fn test_refresh_unknown_path_is_invalid() {
    let remote = FakeRemote::new(release_plan());
    let mut tree = synced(&remote);

    let err = TreeSynchronizer::new(&remote)
        .refresh_node(&mut tree, &NodePath::from(vec![0, 9, 9]))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}
