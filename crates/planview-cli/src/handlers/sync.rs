use crate::context::ExecutionContext;
use anyhow::{Result, bail};
use planview_runtime::{SyncMode, SyncNotice};
use serde_json::json;
use tracing::warn;

pub fn handle(ctx: &ExecutionContext, structure_only: bool) -> Result<()> {
    let mut session = ctx.open_session()?;
    let mode = if structure_only {
        SyncMode::StructureOnly
    } else {
        session.recommended_mode()
    };

    session.request_sync(mode)?;
    if let Some(token) = session.cancel_handle()
        && let Err(e) = ctrlc::set_handler(move || token.cancel())
    {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    if !ctx.is_json() {
        eprintln!("Syncing plan '{}'...", session.plan().name);
    }

    match session.wait_for_sync(None)? {
        SyncNotice::Completed(report) => {
            if ctx.is_json() {
                let output = json!({
                    "plan": session.plan().name,
                    "mode": format!("{:?}", mode),
                    "cache_source": format!("{:?}", session.cache_source()),
                    "report": report,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!(
                    "Synced '{}': {} suites, {} tests, {} points",
                    session.plan().name,
                    report.suites,
                    report.tests,
                    report.points
                );
                if mode != SyncMode::StructureOnly {
                    println!(
                        "  fetched {}, reused {}, history refreshed {}, failed {}, skipped {}",
                        report.fetched,
                        report.reused,
                        report.history_refreshed,
                        report.failed,
                        report.skipped
                    );
                }
            }
            Ok(())
        }
        SyncNotice::Cancelled => bail!("{}", cancelled_message(session.structure_applied())),
        SyncNotice::Failed(error) => bail!("Sync failed: {}", error),
        SyncNotice::StructureApplied => bail!("Sync ended before results were fetched"),
    }
}

fn cancelled_message(structure_applied: bool) -> &'static str {
    if structure_applied {
        "Sync cancelled; plan structure was cached but results were not fetched"
    } else {
        "Sync cancelled; cached tree left unchanged"
    }
}
