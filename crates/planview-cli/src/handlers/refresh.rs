use crate::context::ExecutionContext;
use anyhow::Result;
use planview_runtime::NodeRefresh;
use planview_types::NodePath;
use serde_json::json;

pub fn handle(ctx: &ExecutionContext, node: &NodePath) -> Result<()> {
    let mut session = ctx.open_session()?;
    let outcome = session.refresh_node(node)?;

    if ctx.is_json() {
        let output = json!({ "node": node.to_string(), "refresh": outcome });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match outcome {
        NodeRefresh::Updated { fetched, unchanged } => {
            println!("Refreshed {}: {} updated, {} unchanged", node, fetched, unchanged);
        }
        NodeRefresh::Removed { parent_removed } => {
            println!("Removed {}: the test no longer exists on the remote", node);
            if parent_removed {
                println!("Its suite was empty and was removed too");
            }
        }
    }
    Ok(())
}
