//! Tree synchronization against a [`RemoteSource`].
//!
//! Three operations keep a [`PlanTree`] in line with the remote:
//!
//! - **structure refresh** rebuilds suites and tests without fetching results;
//! - **full refresh** rebuilds the structure, then brings every test point up
//!   to date, reusing cached entities whose run id has not moved;
//! - **node refresh** re-fetches one suite's direct tests or one test, and
//!   prunes tests the remote no longer has.
//!
//! Full refresh works on a freshly built structure and only replaces the
//! tree's roots once every point has been processed, so a failed or
//! cancelled refresh leaves the tree as it was.

use planview_providers::RemoteSource;
use planview_types::{
    NodePath, NodeTag, PlanInfo, PlanTree, PointFilter, ResultEntity, ResultKey, SuiteDescriptor,
    TestCaseMetadata, TestOutcome, TestPoint, TreeNode,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Cooperative cancellation flag shared between a controller and a worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Suite hierarchy of a plan plus the node path of every test
#[derive(Debug, Clone)]
pub struct PlanStructure {
    pub plan: PlanInfo,
    pub roots: Vec<TreeNode>,
    pub index: HashMap<ResultKey, NodePath>,
    pub suites: usize,
}

/// What a full (or structure-only) refresh did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncReport {
    pub suites: usize,
    pub tests: usize,
    pub points: usize,
    /// Cached entity kept because the run id did not change
    pub reused: usize,
    /// Latest result fetched and applied
    pub fetched: usize,
    /// No result, but the cached entity's history was refreshed
    pub history_refreshed: usize,
    /// Point fetch failed; the prior entity was kept
    pub failed: usize,
    /// Test case deleted, or no matching node
    pub skipped: usize,
}

/// Outcome of a single-node refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRefresh {
    Updated {
        /// Tests whose latest result was fetched
        fetched: usize,
        /// Tests whose run id was unchanged
        unchanged: usize,
    },
    /// The test has no point on the remote any more and was removed
    Removed { parent_removed: bool },
}

enum PointSync {
    Reused,
    Fetched,
    HistoryRefreshed,
    Unchanged,
}

/// The cached run id is still current. `0` means "never run" and never matches.
fn run_ids_match(cached: i32, remote: i32) -> bool {
    remote != 0 && cached == remote
}

pub struct TreeSynchronizer<'r> {
    remote: &'r dyn RemoteSource,
    cancel: Option<CancelToken>,
    history_limit: usize,
    metadata: HashMap<i32, TestCaseMetadata>,
}

impl<'r> TreeSynchronizer<'r> {
    pub fn new(remote: &'r dyn RemoteSource) -> Self {
        Self {
            remote,
            cancel: None,
            history_limit: planview_types::HISTORY_LIMIT,
            metadata: HashMap::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.min(planview_types::HISTORY_LIMIT);
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Test case metadata, fetched at most once per refresh.
    fn metadata(&mut self, test_case_id: i32) -> planview_providers::Result<TestCaseMetadata> {
        if let Some(metadata) = self.metadata.get(&test_case_id) {
            return Ok(metadata.clone());
        }
        let metadata = self.remote.test_case(test_case_id)?;
        self.metadata.insert(test_case_id, metadata.clone());
        Ok(metadata)
    }

    /// Build the suite/test hierarchy of the plan. No results are queried.
    pub fn build_structure(&self) -> Result<PlanStructure> {
        let plan = self.remote.plan()?;
        let root_suite = self.remote.list_suites(plan.root_suite_id)?;

        let mut index = HashMap::new();
        let mut suites = 1;
        let root_path = NodePath::root(0);
        let mut root = TreeNode::suite(plan.name.clone(), root_suite.id, root_suite.title.clone());
        add_tests(&mut root, &root_path, &root_suite, &root_suite.title, &mut index);

        for child in &root_suite.children {
            let child_index = root.children.len();
            root.children.push(build_suite(
                child,
                child.title.clone(),
                root_path.child(child_index),
                &mut index,
                &mut suites,
            ));
        }

        Ok(PlanStructure {
            plan,
            roots: vec![root],
            index,
            suites,
        })
    }

    /// Replace the tree with a fresh structure. Cached results are dropped.
    pub fn structure_refresh(&self, tree: &mut PlanTree) -> Result<SyncReport> {
        let structure = self.build_structure()?;
        let report = SyncReport {
            suites: structure.suites,
            tests: structure.index.len(),
            ..SyncReport::default()
        };
        tree.plan_name = structure.plan.name;
        tree.roots = structure.roots;
        info!(suites = report.suites, tests = report.tests, "structure refreshed");
        Ok(report)
    }

    /// Rebuild the structure and bring every test point up to date.
    pub fn full_refresh(&mut self, tree: &mut PlanTree) -> Result<SyncReport> {
        self.metadata.clear();
        let old: HashMap<ResultKey, ResultEntity> = tree
            .all_results()
            .into_iter()
            .map(|entity| (entity.key(), entity.clone()))
            .collect();

        let mut structure = self.build_structure()?;
        self.check_cancelled()?;
        let points = self
            .remote
            .query_test_points(&PointFilter::plan(structure.plan.id))?;

        let mut report = SyncReport {
            suites: structure.suites,
            tests: structure.index.len(),
            points: points.len(),
            ..SyncReport::default()
        };

        for point in &points {
            self.check_cancelled()?;
            if !point.test_case_exists {
                report.skipped += 1;
                continue;
            }
            let key = ResultKey::new(
                point.suite_id,
                point.test_case_id,
                point.configuration_name.clone(),
            );
            let Some(entity) = structure
                .index
                .get(&key)
                .and_then(|path| node_entity_mut(&mut structure.roots, path))
            else {
                debug!(point = point.id, "point has no matching test node");
                report.skipped += 1;
                continue;
            };
            let previous = old.get(&key);

            match sync_point(
                self.remote,
                &mut self.metadata,
                self.history_limit,
                point,
                previous,
                entity,
            ) {
                Ok(PointSync::Reused) => report.reused += 1,
                Ok(PointSync::Fetched) => report.fetched += 1,
                Ok(PointSync::HistoryRefreshed) => report.history_refreshed += 1,
                Ok(PointSync::Unchanged) => {}
                Err(err) if err.is_connection() => return Err(err.into()),
                Err(err) => {
                    warn!(point = point.id, error = %err, "keeping prior result for point");
                    if let Some(previous) = previous {
                        *entity = previous.clone();
                    }
                    report.failed += 1;
                }
            }
        }

        tree.plan_name = structure.plan.name;
        tree.roots = structure.roots;
        info!(
            points = report.points,
            reused = report.reused,
            fetched = report.fetched,
            failed = report.failed,
            "full refresh finished"
        );
        Ok(report)
    }

    /// Refresh the tests directly under a suite node, or a single test node.
    pub fn refresh_node(&mut self, tree: &mut PlanTree, path: &NodePath) -> Result<NodeRefresh> {
        self.metadata.clear();
        let tag = tree
            .node(path)
            .map(|node| node.tag.clone())
            .ok_or_else(|| Error::InvalidOperation(format!("no node at path {}", path)))?;
        let plan = self.remote.plan()?;

        match tag {
            NodeTag::Suite(suite) => {
                let points = self
                    .remote
                    .query_test_points(&PointFilter::suite(plan.id, suite.suite_id))?;
                let mut fetched = 0;
                let mut unchanged = 0;

                for point in points.iter().filter(|p| p.test_case_exists) {
                    self.check_cancelled()?;
                    let Some(node) = tree.node_mut(path) else {
                        break;
                    };
                    let Some(index) = node.find_child(point.test_case_id, &point.configuration_name)
                    else {
                        debug!(point = point.id, "no child node for point");
                        continue;
                    };
                    let child = &mut node.children[index];
                    if let Some(entity) = child.tag.as_test_mut() {
                        if self.patch_entity(entity, point)? {
                            fetched += 1;
                        } else {
                            unchanged += 1;
                        }
                    }
                    child.restore_status();
                }
                Ok(NodeRefresh::Updated { fetched, unchanged })
            }
            NodeTag::Test(entity) => {
                let points = self.remote.query_test_points(&PointFilter::test(
                    plan.id,
                    entity.suite_id,
                    entity.test_id,
                ))?;
                let point = points
                    .into_iter()
                    .find(|p| p.test_case_exists && p.configuration_name == entity.configuration);

                let Some(point) = point else {
                    return Ok(prune(tree, path));
                };
                self.check_cancelled()?;

                let Some(node) = tree.node_mut(path) else {
                    return Err(Error::InvalidOperation(format!("no node at path {}", path)));
                };
                let mut fetched = 0;
                let mut unchanged = 0;
                if let Some(entity) = node.tag.as_test_mut() {
                    if self.patch_entity(entity, &point)? {
                        fetched += 1;
                    } else {
                        unchanged += 1;
                    }
                }
                node.restore_status();
                Ok(NodeRefresh::Updated { fetched, unchanged })
            }
        }
    }

    /// Bring one entity up to date with its point. Returns whether a result was fetched.
    fn patch_entity(&mut self, entity: &mut ResultEntity, point: &TestPoint) -> Result<bool> {
        if run_ids_match(entity.most_recent_run_id, point.most_recent_run_id) {
            entity.state = point.state;
            return Ok(false);
        }
        match self.remote.latest_result(point.id)? {
            Some(record) => {
                let history = self
                    .remote
                    .historic_outcomes(point.id, self.history_limit)?;
                let metadata = self.metadata(point.test_case_id)?;
                entity.apply_result(&record, point.state, history, &metadata);
                debug!(point = point.id, run = record.test_run_id, "applied latest result");
                Ok(true)
            }
            None => {
                entity.state = point.state;
                Ok(false)
            }
        }
    }
}

/// Per-point step of a full refresh. `entity` is the node's fresh entity.
fn sync_point(
    remote: &dyn RemoteSource,
    metadata_cache: &mut HashMap<i32, TestCaseMetadata>,
    history_limit: usize,
    point: &TestPoint,
    previous: Option<&ResultEntity>,
    entity: &mut ResultEntity,
) -> planview_providers::Result<PointSync> {
    let metadata = match metadata_cache.get(&point.test_case_id) {
        Some(metadata) => metadata.clone(),
        None => {
            let metadata = remote.test_case(point.test_case_id)?;
            metadata_cache.insert(point.test_case_id, metadata.clone());
            metadata
        }
    };

    if let Some(previous) = previous
        && previous.outcome != TestOutcome::None
        && run_ids_match(previous.most_recent_run_id, point.most_recent_run_id)
    {
        *entity = previous.clone();
        entity.state = point.state;
        entity.apply_metadata(&metadata);
        return Ok(PointSync::Reused);
    }

    let outcome = match remote.latest_result(point.id)? {
        Some(record) => {
            let history = remote.historic_outcomes(point.id, history_limit)?;
            entity.apply_result(&record, point.state, history, &metadata);
            PointSync::Fetched
        }
        None => match previous {
            Some(previous) => {
                let history = remote.historic_outcomes(point.id, history_limit)?;
                if history.len() != previous.historic_outcomes.len() {
                    *entity = previous.clone();
                    entity.set_history(history);
                    entity.state = point.state;
                    PointSync::HistoryRefreshed
                } else {
                    entity.state = point.state;
                    PointSync::Unchanged
                }
            }
            None => {
                entity.state = point.state;
                PointSync::Unchanged
            }
        },
    };
    entity.apply_metadata(&metadata);
    Ok(outcome)
}

fn build_suite(
    suite: &SuiteDescriptor,
    path: String,
    node_path: NodePath,
    index: &mut HashMap<ResultKey, NodePath>,
    suites: &mut usize,
) -> TreeNode {
    *suites += 1;
    let mut node = TreeNode::suite(suite.title.clone(), suite.id, path.clone());
    add_tests(&mut node, &node_path, suite, &path, index);

    for child in &suite.children {
        let child_index = node.children.len();
        let child_path = format!("{}\\{}", path, child.title);
        node.children.push(build_suite(
            child,
            child_path,
            node_path.child(child_index),
            index,
            suites,
        ));
    }
    node
}

/// One test node per test case and configuration; a test case without
/// configurations gets a single node with an empty configuration.
fn add_tests(
    node: &mut TreeNode,
    node_path: &NodePath,
    suite: &SuiteDescriptor,
    area: &str,
    index: &mut HashMap<ResultKey, NodePath>,
) {
    for test_case in &suite.test_cases {
        let configurations: Vec<&str> = if test_case.configurations.is_empty() {
            vec![""]
        } else {
            test_case.configurations.iter().map(String::as_str).collect()
        };
        for configuration in configurations {
            let entity = ResultEntity::new(
                test_case.title.clone(),
                suite.id,
                test_case.id,
                area,
                configuration,
            );
            index.insert(entity.key(), node_path.child(node.children.len()));
            node.children
                .push(TreeNode::test(test_case.title.clone(), entity));
        }
    }
}

fn node_entity_mut<'a>(roots: &'a mut [TreeNode], path: &NodePath) -> Option<&'a mut ResultEntity> {
    let (first, rest) = path.indices().split_first()?;
    let mut node = roots.get_mut(*first)?;
    for index in rest {
        node = node.children.get_mut(*index)?;
    }
    node.tag.as_test_mut()
}

/// Remove a test node, and its parent if that leaves the parent empty.
fn prune(tree: &mut PlanTree, path: &NodePath) -> NodeRefresh {
    tree.remove(path);
    let mut parent_removed = false;
    if let Some(parent) = path.parent()
        && tree.node(&parent).is_some_and(|node| node.children.is_empty())
    {
        tree.remove(&parent);
        parent_removed = true;
    }
    info!(path = %path, parent_removed, "pruned test missing from remote");
    NodeRefresh::Removed { parent_removed }
}
