use chrono::{DateTime, Utc};
use planview_types::{PointState, ResultEntity, TestOutcome};
use std::time::Duration;

pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Human-readable status: "Active" while queued/running, otherwise the outcome.
pub fn state_text(outcome: TestOutcome, state: PointState) -> String {
    if state.is_active() {
        return "Active".to_string();
    }
    match outcome {
        TestOutcome::Unspecified => "Unspecified (Never Executed)".to_string(),
        other => other.to_string(),
    }
}

pub fn entity_state_text(entity: &ResultEntity) -> String {
    state_text(entity.outcome, entity.state)
}

pub fn format_completed(completed: Option<DateTime<Utc>>) -> String {
    match completed {
        Some(at) => at.format(DATE_FORMAT).to_string(),
        None => "Not run".to_string(),
    }
}

/// `[d:]h:mm:ss[.fffffff]`, or "NA" for a zero duration
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "NA".to_string();
    }
    let total = duration.as_secs();
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, minutes, seconds) = (rem / 3600, (rem % 3600) / 60, rem % 60);

    let mut out = if days > 0 {
        format!("{}:{}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    };

    let ticks = duration.subsec_nanos() / 100;
    if ticks > 0 {
        let fraction = format!("{:07}", ticks);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out
}

/// Outcomes separated by spaces, most recent first
pub fn format_history(outcomes: &[TestOutcome]) -> String {
    outcomes
        .iter()
        .map(TestOutcome::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flatten text for a single delimited cell.
pub fn single_line(text: &str) -> String {
    text.replace('\t', " ")
        .replace("\r\n", "  ")
        .replace(['\r', '\n'], " ")
}
