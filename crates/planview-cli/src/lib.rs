// NOTE: planview CLI layout
//
// Every command opens a `PlanSession` against the configured remote. The
// session loads the working cache (reconciled with its seed first), so
// `tree`, `stats`, `results` and `export` read the last synced state without
// fetching results. Only `sync` and `refresh` talk to the remote beyond
// identifying the plan.
//
// The remote is a JSON plan snapshot (`--remote` or `[remote] snapshot`);
// other sources implement `RemoteSource` and plug into the same session.

mod args;
mod commands;
pub mod context;
mod handlers;
pub mod types;
mod views;

pub use args::{Cli, Commands};
pub use commands::run;
