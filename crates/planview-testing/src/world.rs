//! TestWorld pattern for CLI integration tests.
//!
//! Each world owns a temp directory holding a data directory, a JSON plan
//! snapshot acting as the remote, and a seed directory. Commands run the
//! `planview` binary against that layout.

use anyhow::{Context, Result};
use assert_cmd::Command;
use filetime::{FileTime, set_file_mtime};
use planview_providers::PlanSnapshot;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use planview_testing::{TestWorld, fixtures};
///
/// let world = TestWorld::new().with_plan(&fixtures::release_plan());
/// let result = world.run(&["sync"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
    snapshot_path: PathBuf,
    seed_dir: PathBuf,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let data_dir = base_path.join(".planview");
        let seed_dir = base_path.join("seeds");

        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");
        std::fs::create_dir_all(&seed_dir).expect("Failed to create seed dir");

        let config = format!(
            "[remote]\nsnapshot = {:?}\n\n[cache]\nseed_dir = {:?}\n",
            base_path.join("remote/plan.json").display().to_string(),
            seed_dir.display().to_string(),
        );
        std::fs::write(data_dir.join("config.toml"), config).expect("Failed to write config");

        Self {
            snapshot_path: base_path.join("remote/plan.json"),
            temp_dir,
            data_dir,
            seed_dir,
            env_vars: HashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn seed_dir(&self) -> &Path {
        &self.seed_dir
    }

    /// Directory holding working cache files
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// Serve `snapshot` as the remote.
    pub fn with_plan(self, snapshot: &PlanSnapshot) -> Self {
        snapshot
            .save(&self.snapshot_path)
            .expect("Failed to write plan snapshot");
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Change the remote plan between commands.
    pub fn update_plan(&self, f: impl FnOnce(&mut PlanSnapshot)) -> Result<()> {
        let mut snapshot = PlanSnapshot::load(&self.snapshot_path)?;
        f(&mut snapshot);
        snapshot.save(&self.snapshot_path)?;
        Ok(())
    }

    /// The working cache file, if one has been written
    pub fn cache_file(&self) -> Option<PathBuf> {
        std::fs::read_dir(self.cache_dir())
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".planview.db"))
            })
    }

    /// Install the current working cache as a seed stamped at `unix_time`.
    pub fn promote_cache_to_seed(&self, unix_time: i64) -> Result<PathBuf> {
        let working = self.cache_file().context("no working cache to promote")?;
        let name = working.file_name().context("cache file has no name")?;
        let seed = self.seed_dir.join(name);
        std::fs::copy(&working, &seed)?;
        set_file_mtime(&seed, FileTime::from_unix_time(unix_time, 0))?;
        Ok(seed)
    }

    /// Configure a CLI command with this environment's data dir and env vars.
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--data-dir").arg(self.data_dir());
        cmd.current_dir(self.temp_dir.path());
        cmd.env_remove("PLANVIEW_PATH")
            .env_remove("PLANVIEW_CACHE_DIR")
            .env_remove("PLANVIEW_SEED_DIR")
            .env_remove("RUST_LOG");

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    /// Run the `planview` binary with `args`.
    ///
    /// Uses `Command::cargo_bin()`, which needs the `CARGO_BIN_EXE_` variables
    /// that cargo test sets.
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("planview")
            .map_err(|e| anyhow::anyhow!("Failed to find planview binary: {}", e))?;

        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;

        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Run with `--format json` and parse stdout.
    pub fn run_json(&self, args: &[&str]) -> Result<serde_json::Value> {
        let mut full_args = vec!["--format", "json"];
        full_args.extend_from_slice(args);
        let result = self.run(&full_args)?;
        if !result.success() {
            anyhow::bail!("command {:?} failed: {}", args, result.stderr);
        }
        result.json()
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.stdout).context("stdout is not valid JSON")
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
