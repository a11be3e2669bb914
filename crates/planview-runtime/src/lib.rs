pub mod config;
pub mod error;
pub mod session;
pub mod sync;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{PlanSession, SessionSettings, SharedRemote, SyncNotice, Totals};
pub use sync::{CancelToken, NodeRefresh, PlanStructure, SyncReport, TreeSynchronizer};
pub use worker::{SyncEvent, SyncMode, SyncWorker};
