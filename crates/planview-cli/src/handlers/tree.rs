use crate::context::ExecutionContext;
use crate::views::status_glyph;
use anyhow::Result;
use planview_types::NodeTag;
use serde_json::json;

pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    let session = ctx.open_session()?;
    let tree = session.tree();

    if ctx.is_json() {
        let nodes: Vec<_> = tree
            .walk()
            .into_iter()
            .map(|(path, node)| {
                let (kind, configuration) = match &node.tag {
                    NodeTag::Suite(_) => ("suite", None),
                    NodeTag::Test(entity) => ("test", Some(entity.configuration.as_str())),
                };
                json!({
                    "path": path.to_string(),
                    "title": node.title,
                    "kind": kind,
                    "suite_id": node.tag.suite_id(),
                    "configuration": configuration,
                    "status": node.status,
                })
            })
            .collect();
        let output = json!({
            "plan": tree.plan_name,
            "last_updated": tree.last_updated,
            "nodes": nodes,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if tree.is_empty() {
        println!("No cached tree for '{}'. Run `planview sync` first.", session.plan().name);
        return Ok(());
    }

    for (path, node) in tree.walk() {
        let indent = "  ".repeat(path.depth().saturating_sub(1));
        let label = match &node.tag {
            NodeTag::Test(entity) if !entity.configuration.is_empty() => {
                format!("{} [{}]", node.title, entity.configuration)
            }
            _ => node.title.clone(),
        };
        println!("{:<10} {}{} {}", path.to_string(), indent, status_glyph(node.status), label);
    }
    if let Some(updated) = tree.last_updated {
        println!();
        println!("Last updated {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}
