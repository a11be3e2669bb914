use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::outcome::{PointState, TestOutcome};

/// Test plan as reported by the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    pub id: i32,
    pub name: String,
    pub root_suite_id: i32,
}

/// A suite with its test cases and nested suites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteDescriptor {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub test_cases: Vec<TestCaseEntry>,
    #[serde(default)]
    pub children: Vec<SuiteDescriptor>,
}

impl SuiteDescriptor {
    /// Depth-first search for a suite by id, including `self`.
    pub fn find(&self, suite_id: i32) -> Option<&SuiteDescriptor> {
        if self.id == suite_id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(suite_id))
    }

    pub fn find_mut(&mut self, suite_id: i32) -> Option<&mut SuiteDescriptor> {
        if self.id == suite_id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(suite_id))
    }
}

/// A test case entry inside a suite, with the configurations it runs under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseEntry {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub configurations: Vec<String>,
}

/// One schedulable (test case, configuration) pair inside a suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPoint {
    pub id: i32,
    pub test_case_id: i32,
    pub suite_id: i32,
    #[serde(default)]
    pub configuration_name: String,
    #[serde(default)]
    pub state: PointState,
    /// `0` means the point has never been run
    #[serde(default)]
    pub most_recent_run_id: i32,
    #[serde(default = "default_true")]
    pub test_case_exists: bool,
}

fn default_true() -> bool {
    true
}

/// Latest execution result of a test point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub outcome: TestOutcome,
    #[serde(default)]
    pub date_completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Duration,
    #[serde(default)]
    pub failure_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub configuration_name: String,
    pub test_run_id: i32,
}

/// Descriptive fields of a test case work item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestCaseMetadata {
    pub title: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_automated: bool,
}

/// Test point query filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointFilter {
    pub plan_id: i32,
    pub suite_id: Option<i32>,
    pub test_case_id: Option<i32>,
}

impl PointFilter {
    pub fn plan(plan_id: i32) -> Self {
        Self {
            plan_id,
            ..Default::default()
        }
    }

    pub fn suite(plan_id: i32, suite_id: i32) -> Self {
        Self {
            plan_id,
            suite_id: Some(suite_id),
            test_case_id: None,
        }
    }

    pub fn test(plan_id: i32, suite_id: i32, test_case_id: i32) -> Self {
        Self {
            plan_id,
            suite_id: Some(suite_id),
            test_case_id: Some(test_case_id),
        }
    }

    pub fn matches(&self, point: &TestPoint) -> bool {
        self.suite_id.is_none_or(|id| id == point.suite_id)
            && self.test_case_id.is_none_or(|id| id == point.test_case_id)
    }
}
