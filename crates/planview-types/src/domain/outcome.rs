use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Outcome reported by the remote for a single test execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    /// Never executed
    #[default]
    Unspecified,
    /// Pending / queued
    None,
    Passed,
    Failed,
    Inconclusive,
    Timeout,
    Aborted,
    Blocked,
    NotExecuted,
    Warning,
    Error,
    NotApplicable,
    Paused,
    InProgress,
    NotImpacted,
}

impl TestOutcome {
    pub const ALL: [TestOutcome; 15] = [
        TestOutcome::Unspecified,
        TestOutcome::None,
        TestOutcome::Passed,
        TestOutcome::Failed,
        TestOutcome::Inconclusive,
        TestOutcome::Timeout,
        TestOutcome::Aborted,
        TestOutcome::Blocked,
        TestOutcome::NotExecuted,
        TestOutcome::Warning,
        TestOutcome::Error,
        TestOutcome::NotApplicable,
        TestOutcome::Paused,
        TestOutcome::InProgress,
        TestOutcome::NotImpacted,
    ];

    /// Outcomes that have their own counter; everything else is "other".
    pub const TRACKED: [TestOutcome; 6] = [
        TestOutcome::Passed,
        TestOutcome::Failed,
        TestOutcome::Blocked,
        TestOutcome::Inconclusive,
        TestOutcome::Unspecified,
        TestOutcome::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestOutcome::Unspecified => "Unspecified",
            TestOutcome::None => "None",
            TestOutcome::Passed => "Passed",
            TestOutcome::Failed => "Failed",
            TestOutcome::Inconclusive => "Inconclusive",
            TestOutcome::Timeout => "Timeout",
            TestOutcome::Aborted => "Aborted",
            TestOutcome::Blocked => "Blocked",
            TestOutcome::NotExecuted => "NotExecuted",
            TestOutcome::Warning => "Warning",
            TestOutcome::Error => "Error",
            TestOutcome::NotApplicable => "NotApplicable",
            TestOutcome::Paused => "Paused",
            TestOutcome::InProgress => "InProgress",
            TestOutcome::NotImpacted => "NotImpacted",
        }
    }

    pub fn is_other(&self) -> bool {
        !Self::TRACKED.contains(self)
    }

    /// Outcomes that need a second look but are not outright failures.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            TestOutcome::NotExecuted
                | TestOutcome::Inconclusive
                | TestOutcome::Timeout
                | TestOutcome::Warning
        )
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestOutcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::UnknownVariant(format!("test outcome '{}'", s)))
    }
}

/// Scheduling state of a test point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointState {
    #[default]
    None,
    /// Actively queued or running
    Ready,
    Completed,
    NotReady,
    InProgress,
}

impl PointState {
    pub fn is_active(&self) -> bool {
        matches!(self, PointState::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PointState::None => "None",
            PointState::Ready => "Ready",
            PointState::Completed => "Completed",
            PointState::NotReady => "NotReady",
            PointState::InProgress => "InProgress",
        }
    }
}

impl fmt::Display for PointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
