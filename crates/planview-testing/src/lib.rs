//! Testing infrastructure for planview integration tests.
//!
//! - `fixtures`: `PlanBuilder` and ready-made plans
//! - `remote`: `FakeRemote`, an in-memory remote with call counters and failure injection
//! - `world`: `TestWorld`, an isolated data directory for driving the CLI
//! - `assertions`: checks on the CLI's JSON output

pub mod assertions;
pub mod fixtures;
pub mod remote;
pub mod world;

pub use fixtures::PlanBuilder;
pub use remote::FakeRemote;
pub use world::{CliResult, TestWorld};
