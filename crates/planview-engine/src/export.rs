use planview_types::ResultEntity;
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

use crate::{AllResults, Result, ResultColumn};

/// One listed entity and whether it is the primary result of its test id
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResultRow<'a> {
    pub primary: bool,
    pub entity: &'a ResultEntity,
}

pub fn result_rows<'a>(results: &AllResults<'a>) -> Vec<ResultRow<'a>> {
    results
        .types_and_results()
        .map(|(primary, entity)| ResultRow { primary, entity })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportDelimiter {
    Csv,
    #[default]
    Tsv,
}

impl ExportDelimiter {
    pub fn byte(&self) -> u8 {
        match self {
            ExportDelimiter::Csv => b',',
            ExportDelimiter::Tsv => b'\t',
        }
    }
}

impl FromStr for ExportDelimiter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportDelimiter::Csv),
            "tsv" => Ok(ExportDelimiter::Tsv),
            _ => Err(format!("Unknown export delimiter: {}", s)),
        }
    }
}

/// Write a header plus one line per row, returning the number of rows written.
pub fn write_results<W: Write>(
    rows: &[ResultRow<'_>],
    writer: W,
    delimiter: ExportDelimiter,
) -> Result<usize> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter.byte())
        .from_writer(writer);

    out.write_record(ResultColumn::ALL.iter().map(ResultColumn::header))?;
    for row in rows {
        out.write_record(ResultColumn::ALL.iter().map(|column| column.cell(row)))?;
    }
    out.flush()?;
    Ok(rows.len())
}
