//! On-disk cache of the candidate index.
//!
//! The cache is a single JSON record holding the index and the time it was
//! built. It is reused as long as nothing under the search roots was
//! modified after that time. Every problem reading it degrades to a rebuild.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::package_indexer::PackageIndexer;
use super::walker::{PathWalker, latest_modification};
use crate::config::{Config, StalenessCheck};
use crate::error::{FixError, Result};
use crate::hir::CandidateIndex;

/// Bumped whenever the record layout or the index semantics change.
pub const FORMAT_VERSION: u32 = 1;

/// The persisted form of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub version: u32,
    /// Seconds since the Unix epoch at which the build finished.
    pub timestamp: i64,
    pub packages: CandidateIndex,
}

impl CacheRecord {
    pub fn new(packages: CandidateIndex, built_at: SystemTime) -> Self {
        Self {
            version: FORMAT_VERSION,
            timestamp: unix_seconds(built_at),
            packages,
        }
    }

    pub fn built_at(&self) -> SystemTime {
        from_unix_seconds(self.timestamp)
    }
}

/// Loads, validates and rebuilds the cached candidate index.
#[derive(Debug, Clone)]
pub struct CacheManager {
    path: PathBuf,
    roots: Vec<PathBuf>,
    staleness: StalenessCheck,
    indexer: PackageIndexer,
}

impl CacheManager {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.cache_path.clone(),
            roots: config.search_roots.clone(),
            staleness: config.staleness,
            indexer: PackageIndexer::from_config(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current candidate index, rebuilt when forced or stale.
    pub fn load(&self, force_rebuild: bool) -> CandidateIndex {
        if force_rebuild {
            info!("rebuilding candidate cache on request");
            return self.rebuild();
        }

        let record = match self.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(path = %self.path.display(), "no candidate cache, building");
                return self.rebuild();
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unreadable candidate cache, rebuilding");
                return self.rebuild();
            }
        };

        if record.version != FORMAT_VERSION {
            info!(found = record.version, expected = FORMAT_VERSION, "cache format changed, rebuilding");
            return self.rebuild();
        }

        let built_at = record.built_at();
        match self.latest_modification(built_at) {
            Some(latest) if latest > built_at => {
                info!("search roots modified since last build, rebuilding");
                self.rebuild()
            }
            _ => {
                debug!(packages = record.packages.package_count(), "using cached candidates");
                record.packages
            }
        }
    }

    /// Read the cache record. `Ok(None)` when there is none.
    pub fn read_record(&self) -> io::Result<Option<CacheRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let record = serde_json::from_str(&text)?;
        Ok(Some(record))
    }

    /// Most recent mtime under the search roots. With
    /// [`StalenessCheck::DirectoryMtime`] directories older than `since`
    /// are not descended.
    pub fn latest_modification(&self, since: SystemTime) -> Option<SystemTime> {
        let walker = match self.staleness {
            StalenessCheck::FullScan => PathWalker::new().all_entries(),
            StalenessCheck::DirectoryMtime => PathWalker::new().all_entries().modified_since(since),
        };
        latest_modification(&walker, &self.roots)
    }

    /// Persist `record` atomically: it is written to a temporary file next
    /// to the cache and renamed over it.
    pub fn save(&self, record: &CacheRecord) -> Result<()> {
        let cache_err = |source: io::Error| FixError::Cache {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(cache_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(cache_err)?;
        serde_json::to_writer(&mut tmp, record).map_err(|e| cache_err(e.into()))?;
        tmp.flush().map_err(cache_err)?;
        tmp.persist(&self.path).map_err(|e| cache_err(e.error))?;
        Ok(())
    }

    fn rebuild(&self) -> CandidateIndex {
        let packages = self.indexer.build();
        let record = CacheRecord::new(packages, SystemTime::now());
        if let Err(err) = self.save(&record) {
            warn!(%err, "failed to write candidate cache");
        }
        record.packages
    }
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

fn from_unix_seconds(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}
