//! On-disk unit cache.
//!
//! Generated units survive restarts so a warm process only links. Each
//! artifact is one bincode file named by its key:
//!
//! ```text
//! <dir>/units/
//! ├── 3f2a9c0d1e4b5a67.unit
//! └── ...
//! ```
//!
//! The file modification time doubles as the last-access time: every hit
//! refreshes it and [`ArtifactCache::sweep`] deletes files older than the
//! TTL. Artifacts that fail to decode or describe another template are
//! logged and treated as misses.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use fpath_codegen::Unit;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{CacheError, ContentHash, DiskCacheConfig};

/// Bumped whenever the artifact layout or unit semantics change.
pub const FORMAT_VERSION: u32 = 1;

const EXTENSION: &str = "unit";

#[derive(Serialize, Deserialize)]
struct Artifact {
    version: u32,
    key: u64,
    source_hash: u64,
    unit: Unit,
}

#[derive(Debug)]
pub struct ArtifactCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl ArtifactCache {
    /// Open the cache, creating `<dir>/units` if needed.
    pub fn open(config: &DiskCacheConfig) -> Result<Self, CacheError> {
        let dir = config.dir.join("units");
        fs::create_dir_all(&dir)
            .map_err(|source| CacheError::Io { path: dir.clone(), source })?;
        Ok(ArtifactCache { dir, ttl: config.ttl })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: ContentHash) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    /// Stored unit for `key`, if present and intact.
    pub fn load(&self, key: ContentHash, source_hash: ContentHash) -> Option<Unit> {
        let path = self.path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable artifact");
                return None;
            }
        };

        let artifact: Artifact = match bincode::deserialize(&bytes) {
            Ok(artifact) => artifact,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding corrupt artifact");
                return None;
            }
        };
        if artifact.version != FORMAT_VERSION
            || artifact.key != key.value()
            || artifact.source_hash != source_hash.value()
        {
            warn!(
                path = %path.display(),
                version = artifact.version,
                "discarding stale artifact"
            );
            return None;
        }

        if let Err(err) = touch(&path, SystemTime::now()) {
            debug!(path = %path.display(), error = %err, "could not refresh access time");
        }
        debug!(%key, "artifact cache hit");
        Some(artifact.unit)
    }

    /// Write the unit for `key`. The file appears atomically.
    pub fn store(
        &self,
        key: ContentHash,
        source_hash: ContentHash,
        unit: &Unit,
    ) -> Result<(), CacheError> {
        let artifact = Artifact {
            version: FORMAT_VERSION,
            key: key.value(),
            source_hash: source_hash.value(),
            unit: unit.clone(),
        };
        let bytes = bincode::serialize(&artifact)?;

        let io_err = |source| CacheError::Io { path: self.dir.clone(), source };
        let mut file = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        let path = self.path(key);
        file.persist(&path).map_err(|e| CacheError::Io { path, source: e.error })?;
        debug!(%key, bytes = bytes.len(), "stored artifact");
        Ok(())
    }

    /// Delete artifacts last accessed more than the TTL before `now`.
    pub fn sweep(&self, now: SystemTime) -> Result<usize, CacheError> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };
        let io_err = |source| CacheError::Io { path: self.dir.clone(), source };

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !is_artifact(&path) {
                continue;
            }
            let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
                continue;
            };
            let idle = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if idle > ttl {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    // Another process got there first.
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => return Err(CacheError::Io { path, source }),
                }
            }
        }
        if removed > 0 {
            debug!(removed, "swept expired artifacts");
        }
        Ok(removed)
    }

    /// Number of stored artifacts.
    pub fn count(&self) -> Result<usize, CacheError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|source| CacheError::Io { path: self.dir.clone(), source })?;
        Ok(entries.filter_map(Result::ok).filter(|e| is_artifact(&e.path())).count())
    }
}

fn is_artifact(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(EXTENSION)
}

/// Set the modification time of `path`.
pub(crate) fn touch(path: &Path, at: SystemTime) -> io::Result<()> {
    File::options().write(true).open(path)?.set_modified(at)
}
