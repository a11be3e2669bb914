use clap::ValueEnum;
use planview_engine::ExportDelimiter;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ExportDelimiterArg {
    Csv,
    Tsv,
}

impl From<ExportDelimiterArg> for ExportDelimiter {
    fn from(arg: ExportDelimiterArg) -> Self {
        match arg {
            ExportDelimiterArg::Csv => ExportDelimiter::Csv,
            ExportDelimiterArg::Tsv => ExportDelimiter::Tsv,
        }
    }
}

impl fmt::Display for ExportDelimiterArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportDelimiterArg::Csv => write!(f, "csv"),
            ExportDelimiterArg::Tsv => write!(f, "tsv"),
        }
    }
}
