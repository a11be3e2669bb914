mod outcome;
mod remote;
mod result;

pub use outcome::{PointState, TestOutcome};
pub use remote::{
    PlanInfo, PointFilter, ResultRecord, SuiteDescriptor, TestCaseEntry, TestCaseMetadata,
    TestPoint,
};
pub use result::{HISTORY_LIMIT, ResultEntity, ResultKey, SUITE_TEST_ID, UNSYNCED_RUN_ID};
