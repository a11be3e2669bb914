use planview_types::PlanTree;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::session::SharedRemote;
use crate::sync::{CancelToken, SyncReport, TreeSynchronizer};
use crate::{Error, Result};

/// What a background sync should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Suites and tests only
    StructureOnly,
    /// Structure plus every test point
    Full,
    /// Publish the structure first, then continue with a full refresh
    StructureThenFull,
}

/// Messages from a sync worker to the session that spawned it
#[derive(Debug)]
pub enum SyncEvent {
    StructureReady {
        generation: u64,
        tree: PlanTree,
    },
    Finished {
        generation: u64,
        tree: PlanTree,
        report: SyncReport,
    },
    Failed {
        generation: u64,
        error: String,
    },
    Cancelled {
        generation: u64,
    },
}

impl SyncEvent {
    pub fn generation(&self) -> u64 {
        match self {
            SyncEvent::StructureReady { generation, .. }
            | SyncEvent::Finished { generation, .. }
            | SyncEvent::Failed { generation, .. }
            | SyncEvent::Cancelled { generation } => *generation,
        }
    }
}

/// Handle to a running background sync
pub struct SyncWorker {
    generation: u64,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl SyncWorker {
    /// Sync `tree` (a detached copy of the live tree) on a new thread.
    pub fn spawn(
        remote: SharedRemote,
        tree: PlanTree,
        mode: SyncMode,
        generation: u64,
        history_limit: usize,
        tx: Sender<SyncEvent>,
    ) -> Result<Self> {
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = std::thread::Builder::new()
            .name(format!("planview-sync-{}", generation))
            .spawn(move || {
                let event = run(&remote, tree, mode, generation, history_limit, token, &tx);
                // The session may already be gone.
                let _ = tx.send(event);
            })?;

        debug!(generation, ?mode, "sync worker started");
        Ok(Self {
            generation,
            cancel,
            handle,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait up to `grace` for the thread to exit. Returns false when the
    /// worker was abandoned; its late events are ignored by generation.
    pub fn join_with_grace(self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    generation = self.generation,
                    "sync worker did not stop within grace period; abandoning it"
                );
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        if self.handle.join().is_err() {
            warn!(generation = self.generation, "sync worker panicked");
        }
        true
    }
}

fn run(
    remote: &SharedRemote,
    mut tree: PlanTree,
    mode: SyncMode,
    generation: u64,
    history_limit: usize,
    cancel: CancelToken,
    tx: &Sender<SyncEvent>,
) -> SyncEvent {
    let guard = match remote.lock() {
        Ok(guard) => guard,
        Err(_) => {
            return SyncEvent::Failed {
                generation,
                error: "remote source lock poisoned".to_string(),
            };
        }
    };
    let mut sync = TreeSynchronizer::new(&**guard)
        .with_cancel(cancel)
        .with_history_limit(history_limit);

    let result = match mode {
        SyncMode::StructureOnly => sync.structure_refresh(&mut tree),
        SyncMode::Full => sync.full_refresh(&mut tree),
        SyncMode::StructureThenFull => match sync.structure_refresh(&mut tree) {
            Ok(_) => {
                let _ = tx.send(SyncEvent::StructureReady {
                    generation,
                    tree: tree.clone(),
                });
                sync.full_refresh(&mut tree)
            }
            Err(err) => Err(err),
        },
    };

    match result {
        Ok(report) => SyncEvent::Finished {
            generation,
            tree,
            report,
        },
        Err(Error::Cancelled) => SyncEvent::Cancelled { generation },
        Err(err) => SyncEvent::Failed {
            generation,
            error: err.to_string(),
        },
    }
}
