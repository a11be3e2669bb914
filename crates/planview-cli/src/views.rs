use owo_colors::OwoColorize;
use planview_engine::OutcomeBreakdown;
use planview_types::NodeStatus;

/// Single-character marker for a node status
pub fn status_glyph(status: NodeStatus) -> String {
    match status {
        NodeStatus::Folder => "▸".blue().to_string(),
        NodeStatus::Active => "◷".cyan().to_string(),
        NodeStatus::Passed => "✓".green().to_string(),
        NodeStatus::Failed => "✗".red().to_string(),
        NodeStatus::Attention => "!".yellow().to_string(),
        NodeStatus::Blocked => "■".magenta().to_string(),
        NodeStatus::Queued => "…".cyan().to_string(),
        NodeStatus::NeverRun => "○".dimmed().to_string(),
        NodeStatus::Unknown => "?".dimmed().to_string(),
    }
}

pub fn breakdown_lines(title: &str, counts: &OutcomeBreakdown) -> Vec<String> {
    vec![
        format!("{}", title.bold()),
        format!("  {:<16} {:>6}", "Passed", counts.passed.green()),
        format!("  {:<16} {:>6}", "Failed", counts.failed.red()),
        format!("  {:<16} {:>6}", "Blocked", counts.blocked.magenta()),
        format!("  {:<16} {:>6}", "Inconclusive", counts.inconclusive),
        format!("  {:<16} {:>6}", "Queued", counts.queued),
        format!("  {:<16} {:>6}", "Active", counts.active.cyan()),
        format!("  {:<16} {:>6}", "Never executed", counts.never_executed),
        format!("  {:<16} {:>6}", "Other", counts.other),
        format!("  {:<16} {:>6}", "  Not executed", counts.not_executed),
        format!("  {:<16} {:>6}", "Total", counts.total.bold()),
    ]
}
