use anyhow::{Context, Result, anyhow};
use planview_core::resolve_workspace_path;
use planview_providers::SnapshotSource;
use planview_runtime::{Config, PlanSession, SessionSettings};
use std::path::{Path, PathBuf};

use crate::types::OutputFormat;

pub struct ExecutionContext {
    data_dir: PathBuf,
    config: Config,
    remote: Option<PathBuf>,
    pub format: OutputFormat,
}

impl ExecutionContext {
    pub fn new(
        data_dir: Option<&str>,
        remote: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self> {
        let data_dir = resolve_workspace_path(data_dir)?;
        let config_path = data_dir.join("config.toml");
        let config = Config::load_from(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;

        Ok(Self {
            data_dir,
            config,
            remote,
            format,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The snapshot serving as the remote: `--remote`, then config.
    pub fn remote_path(&self) -> Result<&Path> {
        self.remote
            .as_deref()
            .or(self.config.remote.snapshot.as_deref())
            .ok_or_else(|| anyhow!("No remote configured: pass --remote or set [remote] snapshot"))
    }

    pub fn open_session(&self) -> Result<PlanSession> {
        let source = SnapshotSource::open(self.remote_path()?)?;
        let settings = SessionSettings::from_config(&self.config, &self.data_dir);
        Ok(PlanSession::open(Box::new(source), settings)?)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
