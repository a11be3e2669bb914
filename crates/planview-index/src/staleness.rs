use filetime::FileTime;
use std::path::Path;
use tracing::info;

use crate::Result;

/// Which cache file the session starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// The working cache is current
    Working,
    /// No working cache existed; the seed was copied in
    Seeded,
    /// The seed was newer than the working cache and replaced it
    Refreshed,
    /// Neither file exists
    Missing,
}

/// Bring the working cache up to date with the seed.
///
/// A missing or older working file is overwritten by the seed, and its
/// modification time is set to the seed's so the two compare equal until
/// the next save.
pub fn resolve_stale_cache(working: &Path, seed: Option<&Path>) -> Result<CacheSource> {
    let Some(seed) = seed.filter(|seed| seed.is_file()) else {
        return Ok(if working.exists() {
            CacheSource::Working
        } else {
            CacheSource::Missing
        });
    };

    let seed_time = FileTime::from_last_modification_time(&std::fs::metadata(seed)?);

    let source = if !working.exists() {
        CacheSource::Seeded
    } else {
        let working_time = FileTime::from_last_modification_time(&std::fs::metadata(working)?);
        if working_time < seed_time {
            CacheSource::Refreshed
        } else {
            return Ok(CacheSource::Working);
        }
    };

    if let Some(parent) = working.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(seed, working)?;
    filetime::set_file_mtime(working, seed_time)?;
    info!(
        seed = %seed.display(),
        working = %working.display(),
        ?source,
        "working cache replaced from seed"
    );
    Ok(source)
}
