use crate::context::ExecutionContext;
use crate::views::breakdown_lines;
use anyhow::Result;
use planview_types::NodePath;
use serde_json::json;

pub fn handle(ctx: &ExecutionContext, node: Option<&NodePath>) -> Result<()> {
    let session = ctx.open_session()?;

    match node {
        Some(path) => {
            let counts = session.selected_counts(path)?;
            if ctx.is_json() {
                let output = json!({ "node": path.to_string(), "selected": counts });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for line in breakdown_lines(&format!("Selected ({})", path), &counts) {
                    println!("{}", line);
                }
            }
        }
        None => {
            let totals = session.totals();
            if ctx.is_json() {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                for line in breakdown_lines("All results", &totals.all) {
                    println!("{}", line);
                }
                println!();
                for line in breakdown_lines("Latest per test", &totals.latest) {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}
