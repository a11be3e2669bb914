//! In-memory remote for engine and session tests.
//!
//! Clones share state, so a test can hand one clone to a session and keep
//! another to change the remote, count calls, or inject failures.

use planview_providers::{Error, PlanSnapshot, RemoteSource, Result};
use planview_types::{
    PlanInfo, PointFilter, ResultRecord, SuiteDescriptor, TestCaseMetadata, TestOutcome, TestPoint,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct CallCounts {
    pub plan: AtomicUsize,
    pub list_suites: AtomicUsize,
    pub query_test_points: AtomicUsize,
    pub latest_result: AtomicUsize,
    pub historic_outcomes: AtomicUsize,
    pub test_case: AtomicUsize,
}

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    failing_points: HashSet<i32>,
    result_delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct FakeRemote {
    state: Arc<Mutex<PlanSnapshot>>,
    faults: Arc<Mutex<Faults>>,
    calls: Arc<CallCounts>,
}

impl FakeRemote {
    pub fn new(snapshot: PlanSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
            faults: Arc::new(Mutex::new(Faults::default())),
            calls: Arc::new(CallCounts::default()),
        }
    }

    /// Boxed clone for handing to a session
    pub fn boxed(&self) -> Box<dyn RemoteSource> {
        Box::new(self.clone())
    }

    /// Mutate the remote's plan
    pub fn update(&self, f: impl FnOnce(&mut PlanSnapshot)) {
        f(&mut self.snapshot());
    }

    pub fn snapshot(&self) -> MutexGuard<'_, PlanSnapshot> {
        self.state.lock().expect("fake remote state poisoned")
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    pub fn latest_result_calls(&self) -> usize {
        self.calls.latest_result.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        for counter in [
            &self.calls.plan,
            &self.calls.list_suites,
            &self.calls.query_test_points,
            &self.calls.latest_result,
            &self.calls.historic_outcomes,
            &self.calls.test_case,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    /// Every call fails with a connection error while set
    pub fn set_offline(&self, offline: bool) {
        self.faults().offline = offline;
    }

    /// `latest_result` fails with a query error for this point
    pub fn fail_point(&self, point_id: i32) {
        self.faults().failing_points.insert(point_id);
    }

    /// Sleep in every `latest_result` call
    pub fn set_result_delay(&self, delay: Duration) {
        self.faults().result_delay = Some(delay);
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().expect("fake remote faults poisoned")
    }

    fn check_online(&self) -> Result<()> {
        if self.faults().offline {
            return Err(Error::Connection("remote unreachable".to_string()));
        }
        Ok(())
    }
}

impl RemoteSource for FakeRemote {
    fn plan(&self) -> Result<PlanInfo> {
        self.calls.plan.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.snapshot().plan.clone())
    }

    fn list_suites(&self, root_suite_id: i32) -> Result<SuiteDescriptor> {
        self.calls.list_suites.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.snapshot().suites(root_suite_id)
    }

    fn query_test_points(&self, filter: &PointFilter) -> Result<Vec<TestPoint>> {
        self.calls.query_test_points.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.snapshot().points_matching(filter)
    }

    fn latest_result(&self, point_id: i32) -> Result<Option<ResultRecord>> {
        self.calls.latest_result.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let delay = self.faults().result_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if self.faults().failing_points.contains(&point_id) {
            return Err(Error::Query(format!("result query failed for point {}", point_id)));
        }
        Ok(self.snapshot().latest(point_id))
    }

    fn historic_outcomes(&self, point_id: i32, limit: usize) -> Result<Vec<TestOutcome>> {
        self.calls.historic_outcomes.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.snapshot().history(point_id, limit))
    }

    fn test_case(&self, test_case_id: i32) -> Result<TestCaseMetadata> {
        self.calls.test_case.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.snapshot().metadata(test_case_id)
    }
}
