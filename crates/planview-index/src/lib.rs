// SQLite plan cache
// One file per plan; the live tree is rebuilt from it on startup

mod cache;
mod error;
mod schema;
mod staleness;

// Public API
pub use cache::PlanCache;
pub use error::{Error, Result};
pub use schema::SCHEMA_VERSION;
pub use staleness::{CacheSource, resolve_stale_cache};
