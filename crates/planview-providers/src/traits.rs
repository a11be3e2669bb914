use planview_types::{
    PlanInfo, PointFilter, ResultRecord, SuiteDescriptor, TestCaseMetadata, TestOutcome, TestPoint,
};

use crate::Result;

/// Source of truth for one test plan
///
/// Responsibilities:
/// - Describe the plan and its suite hierarchy
/// - Report test points and their scheduling state
/// - Serve the latest result, recent history and test case metadata per point
///
/// Implementations are used by one thread at a time; callers serialize access.
pub trait RemoteSource: Send {
    /// Plan identity and its root suite
    fn plan(&self) -> Result<PlanInfo>;

    /// Suite hierarchy below (and including) `root_suite_id`
    fn list_suites(&self, root_suite_id: i32) -> Result<SuiteDescriptor>;

    /// Test points of the plan narrowed by `filter`
    fn query_test_points(&self, filter: &PointFilter) -> Result<Vec<TestPoint>>;

    /// Most recent result of a point, `None` when it never ran
    fn latest_result(&self, point_id: i32) -> Result<Option<ResultRecord>>;

    /// Up to `limit` outcomes of a point, most recent first
    fn historic_outcomes(&self, point_id: i32, limit: usize) -> Result<Vec<TestOutcome>>;

    /// Descriptive fields of a test case
    fn test_case(&self, test_case_id: i32) -> Result<TestCaseMetadata>;
}
