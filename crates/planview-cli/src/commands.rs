use super::args::{Cli, Commands};
use super::handlers;
use crate::context::ExecutionContext;
use crate::types::LogLevel;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_level);

    let ctx = ExecutionContext::new(cli.data_dir.as_deref(), cli.remote, cli.format)?;

    match cli.command {
        Commands::Sync { structure_only } => handlers::sync::handle(&ctx, structure_only),
        Commands::Tree => handlers::tree::handle(&ctx),
        Commands::Stats { node } => handlers::stats::handle(&ctx, node.as_ref()),
        Commands::Results { node, sort, desc } => {
            handlers::results::handle(&ctx, node.as_ref(), sort, desc)
        }
        Commands::Refresh { node } => handlers::refresh::handle(&ctx, &node),
        Commands::Export {
            output,
            node,
            delimiter,
        } => handlers::export::handle(&ctx, &output, node.as_ref(), delimiter.into()),
    }
}

/// Log to stderr at `level`; `RUST_LOG` takes precedence when set.
fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
