//! Recursive directory traversal over the search roots.
//!
//! Unlike a plain recursive `read_dir`, the walker follows symbolic links
//! while guarding against cycles: every directory is recorded by its
//! canonical path before it is descended, and a directory seen before is
//! never entered again. The record lives in the walker, so walking several
//! roots with one walker also never visits a shared directory twice.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::debug;

/// What the walker does after visiting a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend into this directory.
    SkipSubtree,
}

/// Callback invoked for every node the walker reaches.
///
/// `entry` is the node's metadata (symbolic links resolved) or the error
/// that prevented reading the node or its entries. Returning `Err` aborts
/// the whole walk.
pub trait Visitor {
    type Error;

    fn visit(
        &mut self,
        path: &Path,
        entry: Result<&Metadata, &io::Error>,
    ) -> Result<WalkControl, Self::Error>;
}

impl<F, E> Visitor for F
where
    F: FnMut(&Path, Result<&Metadata, &io::Error>) -> Result<WalkControl, E>,
{
    type Error = E;

    fn visit(
        &mut self,
        path: &Path,
        entry: Result<&Metadata, &io::Error>,
    ) -> Result<WalkControl, E> {
        self(path, entry)
    }
}

/// Depth-first walker with a shared visited set.
#[derive(Debug)]
pub struct PathWalker {
    visited: Mutex<FxHashSet<PathBuf>>,
    directories_only: bool,
    cutoff: Option<SystemTime>,
}

impl Default for PathWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl PathWalker {
    /// A walker that only surfaces directories.
    pub fn new() -> Self {
        Self {
            visited: Mutex::new(FxHashSet::default()),
            directories_only: true,
            cutoff: None,
        }
    }

    /// Surface files and other non-directory nodes as well.
    pub fn all_entries(mut self) -> Self {
        self.directories_only = false;
        self
    }

    /// Skip directories (and everything below them) last modified before
    /// `cutoff`.
    ///
    /// Editing a file deep in a tree does not touch its ancestors' mtimes,
    /// so this can miss changes.
    pub fn modified_since(mut self, cutoff: SystemTime) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Number of distinct directories entered so far.
    pub fn visited_count(&self) -> usize {
        self.visited.lock().len()
    }

    /// Walk `root`, calling `visitor` for the root and everything below it.
    pub fn walk<V: Visitor>(&self, root: &Path, visitor: &mut V) -> Result<(), V::Error> {
        match fs::metadata(root) {
            Ok(meta) => self.walk_node(root, &meta, visitor),
            Err(err) => visitor.visit(root, Err(&err)).map(|_| ()),
        }
    }

    fn walk_node<V: Visitor>(
        &self,
        path: &Path,
        meta: &Metadata,
        visitor: &mut V,
    ) -> Result<(), V::Error> {
        if !meta.is_dir() {
            if !self.directories_only {
                visitor.visit(path, Ok(meta))?;
            }
            return Ok(());
        }

        if self.is_stale(meta) || !self.mark_visited(path) {
            return Ok(());
        }

        if visitor.visit(path, Ok(meta))? == WalkControl::SkipSubtree {
            return Ok(());
        }

        let mut children = match read_children(path) {
            Ok(children) => children,
            Err(err) => {
                visitor.visit(path, Err(&err))?;
                return Ok(());
            }
        };
        children.sort();

        for child in children {
            // symbolic links resolve to their target; dangling ones are dropped
            let Ok(child_meta) = fs::metadata(&child) else {
                continue;
            };
            self.walk_node(&child, &child_meta, visitor)?;
        }
        Ok(())
    }

    fn is_stale(&self, meta: &Metadata) -> bool {
        match (self.cutoff, meta.modified()) {
            (Some(cutoff), Ok(modified)) => modified < cutoff,
            _ => false,
        }
    }

    /// Record `dir` as visited. Returns false when it already was.
    fn mark_visited(&self, dir: &Path) -> bool {
        let key = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        self.visited.lock().insert(key)
    }
}

/// Non-hidden children of `dir`.
fn read_children(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)?.map(|entry| entry.map(|entry| entry.path()));
    Ok(visible(dir, entries))
}

/// Entries that could be read and are not hidden. An unreadable entry is
/// dropped without affecting the others.
fn visible(dir: &Path, entries: impl IntoIterator<Item = io::Result<PathBuf>>) -> Vec<PathBuf> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                debug!(dir = %dir.display(), %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|path| {
            !path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'))
        })
        .collect()
}

/// The most recent modification time of any node under `roots`, or `None`
/// when nothing could be read.
pub fn latest_modification(walker: &PathWalker, roots: &[PathBuf]) -> Option<SystemTime> {
    let mut latest: Option<SystemTime> = None;
    let mut visit = |_: &Path, entry: Result<&Metadata, &io::Error>| {
        if let Ok(Ok(modified)) = entry.map(Metadata::modified) {
            latest = Some(latest.map_or(modified, |l| l.max(modified)));
        }
        Ok::<_, std::convert::Infallible>(WalkControl::Continue)
    };
    for root in roots {
        let Ok(()) = walker.walk(root, &mut visit);
    }
    latest
}
