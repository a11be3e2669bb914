use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

use super::outcome::{PointState, TestOutcome};
use super::remote::{ResultRecord, TestCaseMetadata};

/// Test id carried by suite placeholders
pub const SUITE_TEST_ID: i32 = -1;

/// Run id of an entity that has never been matched against the remote
pub const UNSYNCED_RUN_ID: i32 = -1;

/// Maximum number of prior outcomes kept per entity
pub const HISTORY_LIMIT: usize = 5;

/// Composite identity used to merge cached entities with remote data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    pub suite_id: i32,
    pub test_id: i32,
    pub configuration: String,
}

impl ResultKey {
    pub fn new(suite_id: i32, test_id: i32, configuration: impl Into<String>) -> Self {
        Self {
            suite_id,
            test_id,
            configuration: configuration.into(),
        }
    }
}

/// The latest known outcome of one test case, in one suite, under one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntity {
    pub test_id: i32,
    pub suite_id: i32,
    #[serde(default)]
    pub configuration: String,

    pub name: String,
    /// Suite path the test lives under
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub test_case_area: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_automated: bool,

    #[serde(default)]
    pub outcome: TestOutcome,
    #[serde(default)]
    pub state: PointState,
    /// `None` until the test has run
    #[serde(default)]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Duration,

    #[serde(default)]
    pub failure_type: String,
    #[serde(default)]
    pub error_message: String,

    pub most_recent_run_id: i32,
    /// Most recent first
    #[serde(default)]
    pub historic_outcomes: Vec<TestOutcome>,
    #[serde(default)]
    pub exists: bool,
}

impl ResultEntity {
    pub fn new(
        name: impl Into<String>,
        suite_id: i32,
        test_id: i32,
        area: impl Into<String>,
        configuration: impl Into<String>,
    ) -> Self {
        Self {
            test_id,
            suite_id,
            configuration: configuration.into(),
            name: name.into(),
            area: area.into(),
            test_case_area: String::new(),
            priority: 0,
            is_automated: false,
            outcome: TestOutcome::default(),
            state: PointState::default(),
            completed: None,
            duration: Duration::ZERO,
            failure_type: String::new(),
            error_message: String::new(),
            most_recent_run_id: UNSYNCED_RUN_ID,
            historic_outcomes: Vec::new(),
            exists: false,
        }
    }

    pub fn suite_placeholder(suite_id: i32, path: impl Into<String>) -> Self {
        Self::new("", suite_id, SUITE_TEST_ID, path, "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.test_id < 0
    }

    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.suite_id, self.test_id, self.configuration.clone())
    }

    /// Ordering used to pick the primary result of a test: completion time,
    /// then suite id. Never-run entities sort first.
    pub fn cmp_recency(&self, other: &Self) -> Ordering {
        self.recency_key().cmp(&other.recency_key())
    }

    pub fn recency_key(&self) -> (Option<DateTime<Utc>>, i32) {
        (self.completed, self.suite_id)
    }

    /// Overwrite execution fields from the remote's latest result.
    ///
    /// A queued result (`TestOutcome::None`) has no completion date; it is
    /// stamped with the current time so it ranks as the newest result.
    pub fn apply_result(
        &mut self,
        record: &ResultRecord,
        state: PointState,
        history: Vec<TestOutcome>,
        metadata: &TestCaseMetadata,
    ) {
        self.outcome = record.outcome;
        self.state = state;
        self.most_recent_run_id = record.test_run_id;
        self.configuration = record.configuration_name.clone();
        self.completed = if record.outcome == TestOutcome::None {
            Some(Utc::now())
        } else {
            record.date_completed
        };
        self.duration = record.duration;
        self.failure_type = record.failure_type.clone().unwrap_or_default();
        self.error_message = record.error_message.clone().unwrap_or_default();
        self.name = metadata.title.clone();
        self.is_automated = metadata.is_automated;
        self.exists = true;
        self.set_history(history);
        self.apply_metadata(metadata);
    }

    pub fn apply_metadata(&mut self, metadata: &TestCaseMetadata) {
        self.test_case_area = metadata.area.clone();
        self.priority = metadata.priority;
    }

    pub fn set_history(&mut self, mut history: Vec<TestOutcome>) {
        history.truncate(HISTORY_LIMIT);
        self.historic_outcomes = history;
    }
}
