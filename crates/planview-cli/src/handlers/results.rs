use crate::context::ExecutionContext;
use anyhow::Result;
use owo_colors::OwoColorize;
use planview_engine::{ResultColumn, ResultSort, SortOrder, format_completed, state_text};
use planview_types::{NodePath, ResultEntity};
use serde::Serialize;

#[derive(Serialize)]
struct RowView<'a> {
    primary: bool,
    #[serde(flatten)]
    entity: &'a ResultEntity,
}

pub fn handle(
    ctx: &ExecutionContext,
    node: Option<&NodePath>,
    sort: Option<ResultColumn>,
    desc: bool,
) -> Result<()> {
    let mut session = ctx.open_session()?;
    if let Some(column) = sort {
        let order = if desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        session.set_sort(ResultSort::new(column, order));
    }
    let rows = session.results(node)?;

    if ctx.is_json() {
        let views: Vec<RowView<'_>> = rows
            .iter()
            .map(|row| RowView {
                primary: row.primary,
                entity: row.entity,
            })
            .collect();
        let output = serde_json::json!({
            "sort": session.sort(),
            "rows": views,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for row in &rows {
        let entity = row.entity;
        let marker = if row.primary { "*" } else { " " };
        let name = if entity.configuration.is_empty() {
            entity.name.clone()
        } else {
            format!("{} [{}]", entity.name, entity.configuration)
        };
        let line = format!(
            "{} {:<30} {:>7}  {:<10}  {}  ({})",
            marker,
            state_text(entity.outcome, entity.state),
            entity.test_id,
            format_completed(entity.completed),
            name,
            entity.area
        );
        if row.primary {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
    Ok(())
}
