use crate::types::{ExportDelimiterArg, LogLevel, OutputFormat};
use clap::{Parser, Subcommand};
use planview_engine::ResultColumn;
use planview_types::NodePath;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "planview")]
#[command(about = "Track test plan results against a remote source of truth", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (default: PLANVIEW_PATH or the system data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Plan snapshot to use as the remote, overriding config.toml
    #[arg(long, global = true)]
    pub remote: Option<PathBuf>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize the cached tree with the remote
    Sync {
        /// Rebuild suites and tests without fetching results
        #[arg(long)]
        structure_only: bool,
    },

    /// Print the cached tree with node paths
    Tree,

    /// Outcome counters for the plan or one node
    Stats {
        #[arg(long)]
        node: Option<NodePath>,
    },

    /// List result rows, grouped by test with the primary result first
    Results {
        #[arg(long)]
        node: Option<NodePath>,

        /// Column to sort by (outcome, name, area, id, priority, completed, ...)
        #[arg(long)]
        sort: Option<ResultColumn>,

        #[arg(long)]
        desc: bool,
    },

    /// Re-fetch one suite's tests or a single test
    Refresh {
        #[arg(long)]
        node: NodePath,
    },

    /// Write result rows to a delimited file
    Export {
        #[arg(long)]
        output: PathBuf,

        #[arg(long)]
        node: Option<NodePath>,

        #[arg(long, default_value = "tsv")]
        delimiter: ExportDelimiterArg,
    },
}
