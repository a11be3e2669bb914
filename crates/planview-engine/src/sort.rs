use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::export::ResultRow;
use crate::format::{
    entity_state_text, format_completed, format_duration, format_history, single_line,
};

/// Columns of a result listing, in export order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultColumn {
    #[default]
    Outcome,
    Name,
    Area,
    Automated,
    Exists,
    Id,
    Priority,
    Completed,
    Duration,
    TestCaseArea,
    FailureType,
    ErrorMessage,
    Primary,
    State,
    History,
}

impl ResultColumn {
    pub const ALL: [ResultColumn; 15] = [
        ResultColumn::Outcome,
        ResultColumn::Name,
        ResultColumn::Area,
        ResultColumn::Automated,
        ResultColumn::Exists,
        ResultColumn::Id,
        ResultColumn::Priority,
        ResultColumn::Completed,
        ResultColumn::Duration,
        ResultColumn::TestCaseArea,
        ResultColumn::FailureType,
        ResultColumn::ErrorMessage,
        ResultColumn::Primary,
        ResultColumn::State,
        ResultColumn::History,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            ResultColumn::Outcome => "Outcome",
            ResultColumn::Name => "Name",
            ResultColumn::Area => "Area",
            ResultColumn::Automated => "IsAutomated",
            ResultColumn::Exists => "CurrentlyExists",
            ResultColumn::Id => "ID",
            ResultColumn::Priority => "Priority",
            ResultColumn::Completed => "Completed",
            ResultColumn::Duration => "Duration",
            ResultColumn::TestCaseArea => "TestCaseArea",
            ResultColumn::FailureType => "FailureType",
            ResultColumn::ErrorMessage => "ErrorMessage",
            ResultColumn::Primary => "Primary",
            ResultColumn::State => "State",
            ResultColumn::History => "Recent History (*most recent first)",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            ResultColumn::Outcome => "outcome",
            ResultColumn::Name => "name",
            ResultColumn::Area => "area",
            ResultColumn::Automated => "automated",
            ResultColumn::Exists => "exists",
            ResultColumn::Id => "id",
            ResultColumn::Priority => "priority",
            ResultColumn::Completed => "completed",
            ResultColumn::Duration => "duration",
            ResultColumn::TestCaseArea => "test_case_area",
            ResultColumn::FailureType => "failure_type",
            ResultColumn::ErrorMessage => "error_message",
            ResultColumn::Primary => "primary",
            ResultColumn::State => "state",
            ResultColumn::History => "history",
        }
    }

    /// Cell text for `row`, flattened to a single line
    pub fn cell(&self, row: &ResultRow<'_>) -> String {
        let e = row.entity;
        match self {
            ResultColumn::Outcome => entity_state_text(e),
            ResultColumn::Name => single_line(&e.name),
            ResultColumn::Area => single_line(&e.area),
            ResultColumn::Automated => e.is_automated.to_string(),
            ResultColumn::Exists => e.exists.to_string(),
            ResultColumn::Id => e.test_id.to_string(),
            ResultColumn::Priority => e.priority.to_string(),
            ResultColumn::Completed => format_completed(e.completed),
            ResultColumn::Duration => format_duration(e.duration),
            ResultColumn::TestCaseArea => single_line(&e.test_case_area),
            ResultColumn::FailureType => single_line(&e.failure_type),
            ResultColumn::ErrorMessage => single_line(&e.error_message),
            ResultColumn::Primary => row.primary.to_string(),
            ResultColumn::State => e.state.to_string(),
            ResultColumn::History => format_history(&e.historic_outcomes),
        }
    }

    fn compare(&self, a: &ResultRow<'_>, b: &ResultRow<'_>) -> Ordering {
        let (x, y) = (a.entity, b.entity);
        match self {
            ResultColumn::Automated => x.is_automated.cmp(&y.is_automated),
            ResultColumn::Exists => x.exists.cmp(&y.exists),
            ResultColumn::Id => x.test_id.cmp(&y.test_id),
            ResultColumn::Priority => x.priority.cmp(&y.priority),
            ResultColumn::Completed => x.completed.cmp(&y.completed),
            ResultColumn::Duration => x.duration.cmp(&y.duration),
            ResultColumn::Primary => a.primary.cmp(&b.primary),
            text => text.cell(a).cmp(&text.cell(b)),
        }
    }
}

impl fmt::Display for ResultColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ResultColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|column| column.key() == wanted)
            .ok_or_else(|| format!("Unknown column: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Sort configuration of a result listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultSort {
    pub column: ResultColumn,
    pub order: SortOrder,
}

impl ResultSort {
    pub fn new(column: ResultColumn, order: SortOrder) -> Self {
        Self { column, order }
    }

    /// Selecting the current column flips the order; a new column starts ascending.
    pub fn toggle(&mut self, column: ResultColumn) {
        if self.column == column {
            self.order = self.order.flip();
        } else {
            self.column = column;
            self.order = SortOrder::Ascending;
        }
    }

    pub fn compare(&self, a: &ResultRow<'_>, b: &ResultRow<'_>) -> Ordering {
        let ordering = self.column.compare(a, b);
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }

    pub fn sort(&self, rows: &mut [ResultRow<'_>]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}
