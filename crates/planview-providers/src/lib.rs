// Remote sources of truth for a test plan.
//
// The synchronization engine only talks to `RemoteSource`; concrete servers
// and the JSON snapshot used by the CLI live behind it.

pub mod error;
pub mod snapshot;
pub mod traits;

pub use error::{Error, Result};
pub use snapshot::{PlanSnapshot, SnapshotSource};
pub use traits::RemoteSource;

pub use planview_types::{
    PlanInfo, PointFilter, ResultRecord, SuiteDescriptor, TestCaseEntry, TestCaseMetadata,
    TestPoint,
};
