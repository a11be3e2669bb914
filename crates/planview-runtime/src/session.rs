//! The session controller.
//!
//! A `PlanSession` owns the live tree of one plan. Background syncs run on a
//! detached copy in a [`SyncWorker`]; their results come back over a channel
//! and are swapped in by whichever thread calls [`PlanSession::poll`] or
//! [`PlanSession::wait_for_sync`]. At most one worker is live at a time.

use chrono::Utc;
use planview_core::{CachePaths, resolve_cache_dir, resolve_seed_dir};
use planview_engine::{
    AllResults, ExportDelimiter, OutcomeBreakdown, ResultColumn, ResultRow, ResultSort,
    result_rows, write_results,
};
use planview_index::{CacheSource, PlanCache, resolve_stale_cache};
use planview_providers::RemoteSource;
use planview_types::{NodePath, PlanInfo, PlanTree, ResultEntity};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::sync::{NodeRefresh, SyncReport, TreeSynchronizer};
use crate::worker::{SyncEvent, SyncMode, SyncWorker};
use crate::{Error, Result};

/// The remote, shared between the controller and at most one worker
pub type SharedRemote = Arc<Mutex<Box<dyn RemoteSource>>>;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cache_dir: PathBuf,
    pub seed_dir: Option<PathBuf>,
    pub cancel_grace: Duration,
    pub history_limit: usize,
}

impl SessionSettings {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            seed_dir: None,
            cancel_grace: Duration::from_secs(1),
            history_limit: planview_types::HISTORY_LIMIT,
        }
    }

    pub fn from_config(config: &Config, workspace: &Path) -> Self {
        Self {
            cache_dir: resolve_cache_dir(workspace, config.cache.dir.as_deref()),
            seed_dir: resolve_seed_dir(config.cache.seed_dir.as_deref()),
            cancel_grace: config.sync.cancel_grace(),
            history_limit: config.sync.history_limit,
        }
    }

    pub fn with_seed_dir(mut self, seed_dir: impl Into<PathBuf>) -> Self {
        self.seed_dir = Some(seed_dir.into());
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }
}

/// Result of handling one worker event on the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// The structure was swapped in; results are still being fetched
    StructureApplied,
    Completed(SyncReport),
    Failed(String),
    Cancelled,
}

impl SyncNotice {
    /// Whether the sync that produced this notice is over
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncNotice::StructureApplied)
    }
}

/// Counters for every result and for primaries only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub all: OutcomeBreakdown,
    pub latest: OutcomeBreakdown,
}

pub struct PlanSession {
    remote: SharedRemote,
    settings: SessionSettings,
    plan: PlanInfo,
    tree: PlanTree,
    cache: PlanCache,
    cache_source: CacheSource,
    loaded_from_cache: bool,
    sort: ResultSort,
    events_tx: Sender<SyncEvent>,
    events_rx: Receiver<SyncEvent>,
    worker: Option<SyncWorker>,
    generation: u64,
    structure_applied: bool,
}

impl PlanSession {
    /// Identify the plan, reconcile the working cache with its seed and load it.
    pub fn open(remote: Box<dyn RemoteSource>, settings: SessionSettings) -> Result<Self> {
        let plan = remote.plan()?;
        let paths = CachePaths::for_plan(
            &settings.cache_dir,
            settings.seed_dir.as_deref(),
            &plan.name,
        );

        let cache_source = match resolve_stale_cache(&paths.working, paths.seed.as_deref()) {
            Ok(source) => source,
            Err(err) => {
                warn!(error = %err, "could not reconcile cache with seed");
                if paths.working.exists() {
                    CacheSource::Working
                } else {
                    CacheSource::Missing
                }
            }
        };

        let cache = PlanCache::new(paths.working);
        let loaded = cache.load();
        let loaded_from_cache = loaded.is_some();
        let tree = loaded.unwrap_or_else(|| PlanTree::new(plan.name.clone()));
        info!(
            plan = %plan.name,
            ?cache_source,
            loaded_from_cache,
            "plan session opened"
        );

        let (events_tx, events_rx) = channel();
        Ok(Self {
            remote: Arc::new(Mutex::new(remote)),
            settings,
            plan,
            tree,
            cache,
            cache_source,
            loaded_from_cache,
            sort: ResultSort::default(),
            events_tx,
            events_rx,
            worker: None,
            generation: 0,
            structure_applied: false,
        })
    }

    pub fn plan(&self) -> &PlanInfo {
        &self.plan
    }

    pub fn tree(&self) -> &PlanTree {
        &self.tree
    }

    pub fn cache_path(&self) -> &Path {
        self.cache.path()
    }

    pub fn cache_source(&self) -> CacheSource {
        self.cache_source
    }

    pub fn loaded_from_cache(&self) -> bool {
        self.loaded_from_cache
    }

    pub fn is_syncing(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the latest sync already swapped in and cached a structure-only tree.
    pub fn structure_applied(&self) -> bool {
        self.structure_applied
    }

    /// Full refresh when a cached tree exists, otherwise structure first.
    pub fn recommended_mode(&self) -> SyncMode {
        if self.loaded_from_cache {
            SyncMode::Full
        } else {
            SyncMode::StructureThenFull
        }
    }

    /// Start a background sync, cancelling any sync already running.
    pub fn request_sync(&mut self, mode: SyncMode) -> Result<u64> {
        self.cancel_sync();
        self.generation += 1;
        self.structure_applied = false;
        let worker = SyncWorker::spawn(
            Arc::clone(&self.remote),
            self.tree.clone(),
            mode,
            self.generation,
            self.settings.history_limit,
            self.events_tx.clone(),
        )?;
        self.worker = Some(worker);
        Ok(self.generation)
    }

    /// Cancel the running sync, waiting up to the grace period for it to stop.
    pub fn cancel_sync(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel();
            let stopped = worker.join_with_grace(self.settings.cancel_grace);
            debug!(stopped, "previous sync cancelled");
        }
    }

    /// A handle that cancels the running sync from another thread.
    pub fn cancel_handle(&self) -> Option<crate::sync::CancelToken> {
        self.worker.as_ref().map(SyncWorker::cancel_token)
    }

    /// Apply any worker events that have arrived, without blocking.
    pub fn poll(&mut self) -> Vec<SyncNotice> {
        let mut notices = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(notice) = self.handle_event(event) {
                notices.push(notice);
            }
        }
        notices
    }

    /// Block until the running sync ends or `timeout` elapses.
    pub fn wait_for_sync(&mut self, timeout: Option<Duration>) -> Result<SyncNotice> {
        if self.worker.is_none() {
            return Err(Error::InvalidOperation("no sync is running".to_string()));
        }
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let wait = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => Duration::from_millis(250),
            };
            match self.events_rx.recv_timeout(wait) {
                Ok(event) => {
                    if let Some(notice) = self.handle_event(event)
                        && notice.is_terminal()
                    {
                        return Ok(notice);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(Error::InvalidOperation(
                            "timed out waiting for sync".to_string(),
                        ));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::InvalidOperation("sync channel closed".to_string()));
                }
            }
        }
    }

    fn handle_event(&mut self, event: SyncEvent) -> Option<SyncNotice> {
        if event.generation() != self.generation {
            debug!(
                generation = event.generation(),
                current = self.generation,
                "discarding result of abandoned sync"
            );
            return None;
        }

        match event {
            SyncEvent::StructureReady { tree, .. } => {
                self.swap_in(tree);
                self.structure_applied = true;
                Some(SyncNotice::StructureApplied)
            }
            SyncEvent::Finished { tree, report, .. } => {
                self.finish_worker();
                self.swap_in(tree);
                self.loaded_from_cache = true;
                Some(SyncNotice::Completed(report))
            }
            SyncEvent::Failed { error, .. } => {
                self.finish_worker();
                warn!(error = %error, "sync failed; keeping current tree");
                Some(SyncNotice::Failed(error))
            }
            SyncEvent::Cancelled { .. } => {
                self.finish_worker();
                info!("sync cancelled; keeping current tree");
                Some(SyncNotice::Cancelled)
            }
        }
    }

    fn finish_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join_with_grace(self.settings.cancel_grace);
        }
    }

    fn swap_in(&mut self, mut tree: PlanTree) {
        tree.sort_by_title();
        tree.restore_status();
        tree.last_updated = Some(Utc::now());
        self.tree = tree;
        self.save_cache();
    }

    fn save_cache(&self) {
        if let Err(err) = self.cache.save(&self.tree) {
            warn!(path = %self.cache.path().display(), error = %err, "failed to write plan cache");
        }
    }

    /// Refresh one suite's tests or a single test against the remote.
    pub fn refresh_node(&mut self, path: &NodePath) -> Result<NodeRefresh> {
        if self.worker.is_some() {
            return Err(Error::Busy);
        }
        let guard = self
            .remote
            .lock()
            .map_err(|_| Error::InvalidOperation("remote source lock poisoned".to_string()))?;
        let mut sync =
            TreeSynchronizer::new(&**guard).with_history_limit(self.settings.history_limit);
        let outcome = sync.refresh_node(&mut self.tree, path);
        drop(guard);

        let outcome = outcome?;
        self.tree.restore_status();
        self.tree.last_updated = Some(Utc::now());
        self.save_cache();
        Ok(outcome)
    }

    fn scope(&self, path: Option<&NodePath>) -> Result<Vec<&ResultEntity>> {
        match path {
            None => Ok(self.tree.all_results()),
            Some(path) => self
                .tree
                .node(path)
                .map(|node| node.leaf_results())
                .ok_or_else(|| Error::InvalidOperation(format!("no node at path {}", path))),
        }
    }

    /// Plan-wide counters, fresh from the current tree
    pub fn totals(&self) -> Totals {
        let results: AllResults = self.tree.all_results().into_iter().collect();
        Totals {
            all: results.breakdown(false),
            latest: results.breakdown(true),
        }
    }

    /// Counters for the tests under one node, duplicates included
    pub fn selected_counts(&self, path: &NodePath) -> Result<OutcomeBreakdown> {
        let results: AllResults = self.scope(Some(path))?.into_iter().collect();
        Ok(results.breakdown(false))
    }

    pub fn sort(&self) -> ResultSort {
        self.sort
    }

    pub fn set_sort(&mut self, sort: ResultSort) {
        self.sort = sort;
    }

    pub fn toggle_sort(&mut self, column: ResultColumn) -> ResultSort {
        self.sort.toggle(column);
        self.sort
    }

    /// Result rows under `path` (or the whole plan), in the session's sort order
    pub fn results(&self, path: Option<&NodePath>) -> Result<Vec<ResultRow<'_>>> {
        let results: AllResults = self.scope(path)?.into_iter().collect();
        let mut rows = result_rows(&results);
        self.sort.sort(&mut rows);
        Ok(rows)
    }

    /// Write result rows grouped by test id, primaries first
    pub fn export<W: Write>(
        &self,
        path: Option<&NodePath>,
        delimiter: ExportDelimiter,
        writer: W,
    ) -> Result<usize> {
        let results: AllResults = self.scope(path)?.into_iter().collect();
        let rows = result_rows(&results);
        Ok(write_results(&rows, writer, delimiter)?)
    }

    /// Stop any running sync. Called automatically on drop.
    pub fn shutdown(&mut self) {
        self.cancel_sync();
    }
}

impl Drop for PlanSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
