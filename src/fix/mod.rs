//! The end-to-end import fix of one Go file.
//!
//! ```text
//! parse target ─→ FileNames ─→ ImportResolver::plan ─→ rewrite
//!                     ↑                ↑
//!          sibling imports      CandidateIndex
//! ```

mod rewrite;

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{FixError, Result};
use crate::hir::{CandidateIndex, FileNames, ImportPlan, ImportResolver, SiblingImports};
use crate::project::SiblingLoader;
use crate::syntax::{Parse, ParseError, ParseMode, parse};

pub use rewrite::rewrite;

/// Output of a fix: the new text and the plan that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixed {
    pub text: String,
    pub plan: ImportPlan,
}

impl Fixed {
    pub fn is_changed(&self) -> bool {
        !self.plan.is_empty()
    }
}

/// Fixes imports against one candidate index.
#[derive(Debug, Clone)]
pub struct Fixer {
    candidates: CandidateIndex,
    siblings: SiblingLoader,
}

impl Fixer {
    pub fn new(candidates: CandidateIndex) -> Self {
        Self {
            candidates,
            siblings: SiblingLoader::new(),
        }
    }

    /// Fix `text` given the imports of its package siblings.
    pub fn fix_source(
        &self,
        text: &str,
        siblings: &SiblingImports,
    ) -> std::result::Result<Fixed, ParseError> {
        let parsed = parse(text, ParseMode::Full)?;
        Ok(self.fix_parsed(text, &parsed, siblings))
    }

    fn fix_parsed(&self, text: &str, parsed: &Parse, siblings: &SiblingImports) -> Fixed {
        let file = parsed.tree();
        let names = FileNames::analyze(&file);
        let plan = ImportResolver::new(&self.candidates, siblings).plan(&names);
        debug!(
            added = plan.additions.len(),
            removed = plan.removals.len(),
            unresolved = plan.unresolved.len(),
            "import plan"
        );
        Fixed {
            text: rewrite(&file, text, &plan),
            plan,
        }
    }

    /// Fix the file at `path`, consulting the other files of its directory.
    pub fn fix_file(&self, path: &Path) -> Result<Fixed> {
        let text = fs::read_to_string(path).map_err(|e| FixError::io(path, e))?;
        let parsed = parse(&text, ParseMode::Full).map_err(|e| FixError::parse(path, &text, e))?;
        let siblings = match parsed.tree().package_name() {
            Some(package) => self.siblings.load(path, &package),
            None => SiblingImports::new(),
        };
        Ok(self.fix_parsed(&text, &parsed, &siblings))
    }

    /// Fix the file at `path` and write it back if anything changed.
    /// Returns whether the file was written.
    pub fn fix_in_place(&self, path: &Path) -> Result<bool> {
        let fixed = self.fix_file(path)?;
        if !fixed.is_changed() {
            return Ok(false);
        }
        write_atomic(path, &fixed.text).map_err(|e| FixError::io(path, e))?;
        Ok(true)
    }
}

/// Replace the contents of `path` by renaming a complete temporary file
/// over it. The file keeps its permissions.
fn write_atomic(path: &Path, text: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path)?.permissions();
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
