//! Discovers Go packages under the search roots.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use smol_str::SmolStr;
use tracing::{debug, info};

use super::walker::{PathWalker, WalkControl};
use crate::config::Config;
use crate::hir::{CandidateIndex, short_name};
use crate::syntax::{ParseMode, parse};

/// A directory holding a Go package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPackage {
    /// Path relative to its search root, `/`-separated.
    pub canonical_path: String,
    /// The name declared by the package clause.
    pub package_name: SmolStr,
}

impl IndexedPackage {
    /// The name the package is indexed under: the last path segment.
    pub fn short_name(&self) -> &str {
        short_name(&self.canonical_path)
    }
}

/// Builds a [`CandidateIndex`] from the configured search roots.
#[derive(Debug, Clone)]
pub struct PackageIndexer {
    roots: Vec<PathBuf>,
    reserved_segments: Vec<String>,
}

impl PackageIndexer {
    pub fn new(roots: Vec<PathBuf>, reserved_segments: Vec<String>) -> Self {
        Self {
            roots,
            reserved_segments,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.search_roots.clone(), config.reserved_segments.clone())
    }

    /// Walk every root and index the packages found, in parallel.
    pub fn build(&self) -> CandidateIndex {
        let walker = PathWalker::new();
        let mut dirs: Vec<PathBuf> = Vec::new();
        for root in &self.roots {
            let mut collect = |path: &Path, entry: Result<&Metadata, &io::Error>| {
                match entry {
                    Ok(_) => dirs.push(path.to_path_buf()),
                    Err(err) => debug!(path = %path.display(), %err, "skipping unreadable path"),
                }
                Ok::<_, std::convert::Infallible>(WalkControl::Continue)
            };
            let Ok(()) = walker.walk(root, &mut collect);
        }

        let packages: Vec<IndexedPackage> = dirs
            .par_iter()
            .filter_map(|dir| self.index_dir(dir))
            .collect();

        let index: CandidateIndex = packages.into_iter().map(|p| p.canonical_path).collect();
        info!(
            directories = walker.visited_count(),
            packages = index.package_count(),
            "indexed search roots"
        );
        index
    }

    /// Index one directory. `None` when it holds no parseable Go package.
    pub fn index_dir(&self, dir: &Path) -> Option<IndexedPackage> {
        let canonical_path = self.canonical_path(dir)?;
        let files = match go_files(dir) {
            Ok(files) if !files.is_empty() => files,
            Ok(_) => return None,
            Err(err) => {
                debug!(dir = %dir.display(), %err, "cannot list directory");
                return None;
            }
        };

        let mut package_name = None;
        for file in &files {
            let text = match fs::read_to_string(file) {
                Ok(text) => text,
                Err(err) => {
                    debug!(file = %file.display(), %err, "skipping unreadable package");
                    return None;
                }
            };
            match parse(&text, ParseMode::PackageClause) {
                Ok(parsed) => {
                    if package_name.is_none() {
                        package_name = parsed.tree().package_name();
                    }
                }
                Err(err) => {
                    debug!(file = %file.display(), %err, "skipping package with parse error");
                    return None;
                }
            }
        }

        Some(IndexedPackage {
            canonical_path,
            package_name: package_name?,
        })
    }

    /// `dir` relative to the longest search root containing it, with
    /// leading reserved segments removed.
    pub fn canonical_path(&self, dir: &Path) -> Option<String> {
        let relative = self
            .roots
            .iter()
            .filter_map(|root| dir.strip_prefix(root).ok())
            .min_by_key(|rel| rel.components().count())?;

        let segments = relative.components().filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        });
        let mut parts = Vec::new();
        let mut leading = true;
        for segment in segments {
            if leading && self.reserved_segments.iter().any(|r| segment == r.as_str()) {
                continue;
            }
            leading = false;
            parts.push(segment);
        }
        (!parts.is_empty()).then(|| parts.join("/"))
    }
}

/// Non-test `.go` files directly inside `dir`, sorted.
fn go_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || !name.ends_with(".go") || name.ends_with("_test.go") {
            continue;
        }
        if entry.file_type()?.is_dir() {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}
