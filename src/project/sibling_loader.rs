//! Loads the imports of the other files in a target file's package.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::hir::SiblingImports;
use crate::syntax::{ParseMode, parse};

/// Loads sibling imports for target files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingLoader;

impl SiblingLoader {
    pub fn new() -> Self {
        Self
    }

    /// Imports of the `.go` files next to `target` that belong to package
    /// `package`.
    ///
    /// Test files only contribute when `target` is a test file itself. Files
    /// that cannot be read or parsed are skipped.
    pub fn load(&self, target: &Path, package: &str) -> SiblingImports {
        let mut siblings = SiblingImports::new();
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let target_is_test = is_test_file(target);

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %dir.display(), %err, "cannot list sibling files");
                return siblings;
            }
        };
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "go"))
            .filter(|path| path.file_name() != target.file_name())
            .filter(|path| target_is_test || !is_test_file(path))
            .collect();
        paths.sort();

        for path in paths {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    debug!(file = %path.display(), %err, "skipping unreadable sibling");
                    continue;
                }
            };
            let parsed = match parse(&text, ParseMode::ImportsOnly) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!(file = %path.display(), %err, "skipping unparseable sibling");
                    continue;
                }
            };
            let file = parsed.tree();
            let in_package = file
                .package_name()
                .is_some_and(|name| same_package(&name, package));
            if in_package {
                siblings.add_file(&file);
            }
        }
        siblings
    }
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with("_test.go"))
}

/// An external test package `p_test` shares its imports with `p`.
fn same_package(a: &str, b: &str) -> bool {
    a.strip_suffix("_test").unwrap_or(a) == b.strip_suffix("_test").unwrap_or(b)
}
