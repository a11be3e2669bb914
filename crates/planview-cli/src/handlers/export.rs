use crate::context::ExecutionContext;
use anyhow::{Context, Result};
use planview_engine::ExportDelimiter;
use planview_types::NodePath;
use serde_json::json;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn handle(
    ctx: &ExecutionContext,
    output: &Path,
    node: Option<&NodePath>,
    delimiter: ExportDelimiter,
) -> Result<()> {
    let session = ctx.open_session()?;
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let rows = session.export(node, delimiter, BufWriter::new(file))?;

    if ctx.is_json() {
        let summary = json!({ "output": output.display().to_string(), "rows": rows });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Exported {} rows to {}", rows, output.display());
    }
    Ok(())
}
