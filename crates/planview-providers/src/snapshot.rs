use planview_types::{
    PlanInfo, PointFilter, PointState, ResultRecord, SuiteDescriptor, TestCaseMetadata,
    TestOutcome, TestPoint,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, RemoteSource, Result};

/// Point-in-time export of a plan: hierarchy, points, results and test cases.
///
/// `results` holds each point's results newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub plan: PlanInfo,
    pub root: SuiteDescriptor,
    #[serde(default)]
    pub test_cases: BTreeMap<i32, TestCaseMetadata>,
    #[serde(default)]
    pub points: Vec<TestPoint>,
    #[serde(default)]
    pub results: BTreeMap<i32, Vec<ResultRecord>>,
}

impl PlanSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::Connection(format!("snapshot not found: {}", path.display()))
            } else {
                Error::Io(err)
            }
        })?;
        let snapshot: PlanSnapshot = serde_json::from_str(&content)?;
        debug!(
            plan = %snapshot.plan.name,
            points = snapshot.points.len(),
            "loaded plan snapshot"
        );
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn suites(&self, root_suite_id: i32) -> Result<SuiteDescriptor> {
        self.root
            .find(root_suite_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("suite {}", root_suite_id)))
    }

    pub fn points_matching(&self, filter: &PointFilter) -> Result<Vec<TestPoint>> {
        if filter.plan_id != self.plan.id {
            return Err(Error::NotFound(format!("plan {}", filter.plan_id)));
        }
        Ok(self
            .points
            .iter()
            .filter(|point| filter.matches(point))
            .cloned()
            .collect())
    }

    pub fn latest(&self, point_id: i32) -> Option<ResultRecord> {
        self.results
            .get(&point_id)
            .and_then(|results| results.first())
            .cloned()
    }

    pub fn history(&self, point_id: i32, limit: usize) -> Vec<TestOutcome> {
        self.results
            .get(&point_id)
            .map(|results| results.iter().take(limit).map(|r| r.outcome).collect())
            .unwrap_or_default()
    }

    pub fn metadata(&self, test_case_id: i32) -> Result<TestCaseMetadata> {
        self.test_cases
            .get(&test_case_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("test case {}", test_case_id)))
    }

    pub fn point_mut(&mut self, point_id: i32) -> Option<&mut TestPoint> {
        self.points.iter_mut().find(|point| point.id == point_id)
    }

    /// Record a new run of a point, as the remote would after an execution.
    pub fn record_result(&mut self, point_id: i32, record: ResultRecord) {
        if let Some(point) = self.point_mut(point_id) {
            point.most_recent_run_id = record.test_run_id;
            point.state = PointState::Completed;
        }
        self.results.entry(point_id).or_default().insert(0, record);
    }

    pub fn remove_point(&mut self, point_id: i32) -> Option<TestPoint> {
        let index = self.points.iter().position(|point| point.id == point_id)?;
        self.results.remove(&point_id);
        Some(self.points.remove(index))
    }
}

/// Remote source backed by a JSON snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: PlanSnapshot,
    origin: Option<PathBuf>,
}

impl SnapshotSource {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            snapshot: PlanSnapshot::load(path)?,
            origin: Some(path.to_path_buf()),
        })
    }

    pub fn from_snapshot(snapshot: PlanSnapshot) -> Self {
        Self {
            snapshot,
            origin: None,
        }
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn snapshot(&self) -> &PlanSnapshot {
        &self.snapshot
    }
}

impl RemoteSource for SnapshotSource {
    fn plan(&self) -> Result<PlanInfo> {
        Ok(self.snapshot.plan.clone())
    }

    fn list_suites(&self, root_suite_id: i32) -> Result<SuiteDescriptor> {
        self.snapshot.suites(root_suite_id)
    }

    fn query_test_points(&self, filter: &PointFilter) -> Result<Vec<TestPoint>> {
        self.snapshot.points_matching(filter)
    }

    fn latest_result(&self, point_id: i32) -> Result<Option<ResultRecord>> {
        Ok(self.snapshot.latest(point_id))
    }

    fn historic_outcomes(&self, point_id: i32, limit: usize) -> Result<Vec<TestOutcome>> {
        Ok(self.snapshot.history(point_id, limit))
    }

    fn test_case(&self, test_case_id: i32) -> Result<TestCaseMetadata> {
        self.snapshot.metadata(test_case_id)
    }
}
