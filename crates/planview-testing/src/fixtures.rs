//! Plan fixtures.
//!
//! `PlanBuilder` assembles a [`PlanSnapshot`] the way a remote would report
//! it: suites, test cases with their configurations, one point per
//! configuration, and results recorded newest first.

use chrono::{DateTime, TimeZone, Utc};
use planview_providers::{
    PlanInfo, PlanSnapshot, ResultRecord, SuiteDescriptor, TestCaseEntry, TestCaseMetadata,
    TestPoint,
};
use planview_types::{PointState, TestOutcome};
use std::time::Duration;

/// Fluent builder for plan snapshots.
///
/// # Example
/// ```
/// use planview_testing::PlanBuilder;
/// use planview_types::TestOutcome;
///
/// let snapshot = PlanBuilder::new(7, "Release 3")
///     .suite(100, 1, "Login")
///     .test(1, 10, "Sign in", &["Windows"])
///     .result(1, 10, "Windows", TestOutcome::Passed, 101, 2)
///     .build();
/// assert_eq!(snapshot.points.len(), 1);
/// ```
pub struct PlanBuilder {
    snapshot: PlanSnapshot,
    next_point_id: i32,
}

/// Root suite id used by every builder plan
pub const ROOT_SUITE_ID: i32 = 100;

impl PlanBuilder {
    pub fn new(plan_id: i32, name: &str) -> Self {
        Self {
            snapshot: PlanSnapshot {
                plan: PlanInfo {
                    id: plan_id,
                    name: name.to_string(),
                    root_suite_id: ROOT_SUITE_ID,
                },
                root: SuiteDescriptor {
                    id: ROOT_SUITE_ID,
                    title: name.to_string(),
                    test_cases: Vec::new(),
                    children: Vec::new(),
                },
                test_cases: Default::default(),
                points: Vec::new(),
                results: Default::default(),
            },
            next_point_id: 1,
        }
    }

    /// Add a child suite under `parent_id`.
    pub fn suite(mut self, parent_id: i32, suite_id: i32, title: &str) -> Self {
        let parent = self
            .snapshot
            .root
            .find_mut(parent_id)
            .unwrap_or_else(|| panic!("unknown parent suite {}", parent_id));
        parent.children.push(SuiteDescriptor {
            id: suite_id,
            title: title.to_string(),
            test_cases: Vec::new(),
            children: Vec::new(),
        });
        self
    }

    /// Add a test case to a suite with one never-run point per configuration.
    pub fn test(
        mut self,
        suite_id: i32,
        test_case_id: i32,
        title: &str,
        configurations: &[&str],
    ) -> Self {
        let suite = self
            .snapshot
            .root
            .find_mut(suite_id)
            .unwrap_or_else(|| panic!("unknown suite {}", suite_id));
        suite.test_cases.push(TestCaseEntry {
            id: test_case_id,
            title: title.to_string(),
            configurations: configurations.iter().map(|c| c.to_string()).collect(),
        });

        self.snapshot
            .test_cases
            .entry(test_case_id)
            .or_insert_with(|| TestCaseMetadata {
                title: title.to_string(),
                area: String::new(),
                priority: 2,
                is_automated: false,
            });

        let point_configurations: Vec<&str> = if configurations.is_empty() {
            vec![""]
        } else {
            configurations.to_vec()
        };
        for configuration in point_configurations {
            self.snapshot.points.push(TestPoint {
                id: self.next_point_id,
                test_case_id,
                suite_id,
                configuration_name: configuration.to_string(),
                state: PointState::Ready,
                most_recent_run_id: 0,
                test_case_exists: true,
            });
            self.next_point_id += 1;
        }
        self
    }

    /// Override a test case's metadata.
    pub fn metadata(
        mut self,
        test_case_id: i32,
        priority: i32,
        area: &str,
        is_automated: bool,
    ) -> Self {
        if let Some(metadata) = self.snapshot.test_cases.get_mut(&test_case_id) {
            metadata.priority = priority;
            metadata.area = area.to_string();
            metadata.is_automated = is_automated;
        }
        self
    }

    /// Record a completed run, completed on January `day` 2026.
    pub fn result(
        mut self,
        suite_id: i32,
        test_case_id: i32,
        configuration: &str,
        outcome: TestOutcome,
        run_id: i32,
        day: u32,
    ) -> Self {
        let point_id = point_id(&self.snapshot, suite_id, test_case_id, configuration)
            .unwrap_or_else(|| {
                panic!("no point for {}/{}/{}", suite_id, test_case_id, configuration)
            });
        self.snapshot
            .record_result(point_id, record(outcome, run_id, day, configuration));
        self
    }

    /// Mark the points of a test case as belonging to a deleted work item.
    pub fn deleted(mut self, test_case_id: i32) -> Self {
        for point in &mut self.snapshot.points {
            if point.test_case_id == test_case_id {
                point.test_case_exists = false;
            }
        }
        self
    }

    pub fn build(self) -> PlanSnapshot {
        self.snapshot
    }
}

/// Point id of a (suite, test case, configuration) triple
pub fn point_id(
    snapshot: &PlanSnapshot,
    suite_id: i32,
    test_case_id: i32,
    configuration: &str,
) -> Option<i32> {
    snapshot
        .points
        .iter()
        .find(|p| {
            p.suite_id == suite_id
                && p.test_case_id == test_case_id
                && p.configuration_name == configuration
        })
        .map(|p| p.id)
}

/// Noon UTC on January `day` 2026
pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0)
        .single()
        .expect("valid fixture date")
}

pub fn record(
    outcome: TestOutcome,
    run_id: i32,
    completed_day: u32,
    configuration: &str,
) -> ResultRecord {
    let failed = outcome == TestOutcome::Failed;
    ResultRecord {
        outcome,
        date_completed: Some(day(completed_day)),
        duration: Duration::from_secs(90),
        failure_type: failed.then(|| "Regression".to_string()),
        error_message: failed.then(|| "expected 200\nactual 500".to_string()),
        configuration_name: configuration.to_string(),
        test_run_id: run_id,
    }
}

/// A plan with nested suites, multiple configurations, a test shared by two
/// suites, a never-run test and a test with history.
///
/// ```text
/// Release 3 (100)
/// ├── Login (1)
/// │   ├── Sign in (10) [Windows: Passed run 101, Linux: Failed run 102]
/// │   ├── Shared check (5) Passed run 103, Jan 1
/// │   └── OAuth (3)
/// │       └── Token refresh (12) Blocked run 105 after Passed run 90
/// └── Payments (2)
///     ├── Shared check (5) Failed run 104, Jan 5
///     └── Refund (11) never run
/// ```
pub fn release_plan() -> PlanSnapshot {
    PlanBuilder::new(7, "Release 3")
        .suite(ROOT_SUITE_ID, 1, "Login")
        .suite(1, 3, "OAuth")
        .suite(ROOT_SUITE_ID, 2, "Payments")
        .test(1, 10, "Sign in", &["Windows", "Linux"])
        .test(1, 5, "Shared check", &[])
        .test(3, 12, "Token refresh", &[])
        .test(2, 5, "Shared check", &[])
        .test(2, 11, "Refund", &[])
        .metadata(10, 1, "Login", true)
        .result(1, 10, "Windows", TestOutcome::Passed, 101, 2)
        .result(1, 10, "Linux", TestOutcome::Failed, 102, 3)
        .result(1, 5, "", TestOutcome::Passed, 103, 1)
        .result(3, 12, "", TestOutcome::Passed, 90, 1)
        .result(3, 12, "", TestOutcome::Blocked, 105, 4)
        .result(2, 5, "", TestOutcome::Failed, 104, 5)
        .build()
}
