//! Import resolution: deciding which specs to add and which to drop.
//!
//! Resolution of one unresolved qualifier looks in two places, in order:
//!
//! 1. **Sibling imports** - what the other files of the same package import
//!    under that name. A package's files tend to agree on their imports, so
//!    this also settles names the index finds ambiguous.
//! 2. **Candidate index** - every package under the search roots. Only a
//!    unique match is used.
//!
//! The result is an [`ImportPlan`]; nothing here touches source text.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::debug;

use super::candidates::{CandidateIndex, Candidates};
use super::names::{FileNames, assumed_name, last_segment};
use crate::base::TextRange;
use crate::syntax::SourceFile;

// ============================================================================
// SIBLING IMPORTS
// ============================================================================

/// Names under which the other files of a package import their packages.
///
/// Keyed by the last path segment, the assumed package name and any alias.
/// When two files disagree the later entry wins.
#[derive(Clone, Debug, Default)]
pub struct SiblingImports {
    by_name: IndexMap<SmolStr, String>,
}

impl SiblingImports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one import spec.
    pub fn add(&mut self, alias: Option<&str>, path: &str) {
        let last = last_segment(path);
        if !last.is_empty() {
            self.by_name.insert(SmolStr::new(last), path.to_string());
        }
        if let Some(assumed) = assumed_name(path) {
            self.by_name.insert(assumed, path.to_string());
        }
        if let Some(alias) = alias.filter(|a| !matches!(*a, "_" | ".")) {
            self.by_name.insert(SmolStr::new(alias), path.to_string());
        }
    }

    /// Register every import spec of a parsed file.
    pub fn add_file(&mut self, file: &SourceFile) {
        for spec in file.import_specs() {
            if let Some(path) = spec.path() {
                self.add(spec.alias_text().as_deref(), &path);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ============================================================================
// RESOLUTION RESULTS
// ============================================================================

/// Where a resolved path came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveSource {
    Sibling,
    Index,
}

/// Result of resolving one qualifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult {
    /// Resolved to a single import path.
    Found { path: String, source: ResolveSource },
    /// Several packages share the name.
    Ambiguous(Vec<String>),
    /// No package with that name.
    NotFound,
}

impl ResolveResult {
    /// The resolved path if unambiguous.
    pub fn path(&self) -> Option<&str> {
        match self {
            ResolveResult::Found { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(_))
    }
}

/// An import spec to insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Addition {
    /// The qualifier that asked for it.
    pub name: SmolStr,
    pub path: String,
    /// Set when `name` differs from the name assumed from `path`.
    pub alias: Option<SmolStr>,
    pub source: ResolveSource,
}

/// An existing import spec to delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    pub path: String,
    pub alias: Option<SmolStr>,
    pub range: TextRange,
}

/// Every change the fixer will make to one file's imports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub additions: Vec<Addition>,
    pub removals: Vec<Removal>,
    /// Qualifiers still bound to nothing.
    pub unresolved: Vec<SmolStr>,
}

impl ImportPlan {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves unresolved qualifiers against sibling imports and the index.
#[derive(Clone, Debug)]
pub struct ImportResolver<'a> {
    candidates: &'a CandidateIndex,
    siblings: &'a SiblingImports,
}

impl<'a> ImportResolver<'a> {
    pub fn new(candidates: &'a CandidateIndex, siblings: &'a SiblingImports) -> Self {
        Self {
            candidates,
            siblings,
        }
    }

    /// Resolve one qualifier name to an import path.
    pub fn resolve(&self, name: &str) -> ResolveResult {
        if let Some(path) = self.siblings.get(name) {
            return ResolveResult::Found {
                path: path.to_string(),
                source: ResolveSource::Sibling,
            };
        }
        match self.candidates.lookup(name) {
            Candidates::Unique(path) => ResolveResult::Found {
                path: path.to_string(),
                source: ResolveSource::Index,
            },
            Candidates::Ambiguous(paths) => {
                ResolveResult::Ambiguous(paths.into_iter().map(str::to_string).collect())
            }
            Candidates::Missing => ResolveResult::NotFound,
        }
    }

    /// Compute the additions and removals for a file.
    ///
    /// An existing spec survives only through its own bound name. A path
    /// imported under a name nothing uses is removed, and the qualifier that
    /// resolves to it gets a fresh spec binding that qualifier.
    pub fn plan(&self, names: &FileNames) -> ImportPlan {
        let mut bound_paths: FxHashSet<String> = FxHashSet::default();
        let mut plan = ImportPlan::default();

        for name in names.unresolved() {
            match self.resolve(&name) {
                ResolveResult::Found { path, source } => {
                    if !bound_paths.insert(path.clone()) {
                        debug!(%name, %path, "package already bound by another qualifier");
                        continue;
                    }
                    let alias = needs_alias(&name, &path).then(|| name.clone());
                    plan.additions.push(Addition {
                        name,
                        path,
                        alias,
                        source,
                    });
                }
                ResolveResult::Ambiguous(paths) => {
                    debug!(%name, ?paths, "ambiguous package name, leaving unresolved");
                    plan.unresolved.push(name);
                }
                ResolveResult::NotFound => {
                    debug!(%name, "no package found");
                    plan.unresolved.push(name);
                }
            }
        }

        plan.removals = names
            .imports()
            .iter()
            .filter(|import| !names.is_used(import))
            .map(|import| Removal {
                path: import.path.clone(),
                alias: import.alias.clone(),
                range: import.range,
            })
            .collect();
        plan
    }
}

/// Whether importing `path` without an alias would fail to bind `name`.
fn needs_alias(name: &str, path: &str) -> bool {
    last_segment(path) != name && assumed_name(path).as_deref() != Some(name)
}
