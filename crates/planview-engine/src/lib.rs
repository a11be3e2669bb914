// Engine module - result aggregation and presentation helpers
// This layer sits between the plan tree (types) and CLI presentation

pub mod aggregation;
pub mod error;
pub mod export;
pub mod format;
pub mod sort;

pub use aggregation::{AllResults, OutcomeBreakdown};
pub use error::{Error, Result};
pub use export::{ExportDelimiter, ResultRow, result_rows, write_results};
pub use format::{entity_state_text, format_completed, format_duration, format_history, state_text};
pub use sort::{ResultColumn, ResultSort, SortOrder};
