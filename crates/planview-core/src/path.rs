use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Suffix of working and seed cache files
pub const CACHE_FILE_EXTENSION: &str = "planview.db";

/// Resolve the workspace data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. PLANVIEW_PATH environment variable (with tilde expansion)
/// 3. System data directory (recommended default)
/// 4. ~/.planview (fallback for systems without standard data directory)
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("PLANVIEW_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("planview"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".planview"));
    }

    Err(Error::Config(
        "Could not determine workspace path: no HOME directory or system data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Directory holding the per-user working caches.
///
/// Priority: explicit override, PLANVIEW_CACHE_DIR, `<workspace>/cache`.
pub fn resolve_cache_dir(workspace: &Path, explicit: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit {
        return expand_tilde(dir);
    }
    if let Ok(env_dir) = std::env::var("PLANVIEW_CACHE_DIR") {
        return expand_tilde(&env_dir);
    }
    workspace.join("cache")
}

/// Directory holding shipped seed caches, if one can be determined.
///
/// Priority: explicit override, PLANVIEW_SEED_DIR, `seeds/` next to the executable.
pub fn resolve_seed_dir(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(expand_tilde(dir));
    }
    if let Ok(env_dir) = std::env::var("PLANVIEW_SEED_DIR") {
        return Some(expand_tilde(&env_dir));
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("seeds")))
}

/// Stable SHA256 hex digest of a plan name
pub fn plan_hash(plan_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plan_name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File name of the cache for `plan_name`, identical in the seed and working directories
pub fn plan_cache_file_name(plan_name: &str) -> String {
    format!("{}.{}", plan_hash(plan_name), CACHE_FILE_EXTENSION)
}

/// Working and seed cache file locations for one plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub working: PathBuf,
    pub seed: Option<PathBuf>,
}

impl CachePaths {
    pub fn for_plan(cache_dir: &Path, seed_dir: Option<&Path>, plan_name: &str) -> Self {
        let file_name = plan_cache_file_name(plan_name);
        Self {
            working: cache_dir.join(&file_name),
            seed: seed_dir.map(|dir| dir.join(&file_name)),
        }
    }
}
