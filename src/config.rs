//! Runtime configuration: search roots, cache location, staleness policy.
//!
//! [`Config::from_env`] derives everything from the Go environment
//! (`GOPATH`, `GOROOT`) and `GOFIXIMPORT_CACHE`; the CLI then overrides
//! individual fields.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache file location.
pub const CACHE_ENV: &str = "GOFIXIMPORT_CACHE";

/// Path components stripped from the front of a package path relative to
/// its search root.
pub const DEFAULT_RESERVED_SEGMENTS: &[&str] = &["src", "pkg"];

const CACHE_FILE_NAME: &str = "candidates.json";

/// How the cache decides whether the search roots changed since the last
/// build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalenessCheck {
    /// Scan the mtime of every file and directory.
    #[default]
    FullScan,
    /// Only descend into directories modified after the cached timestamp.
    /// Faster, but misses edits that leave directory mtimes untouched.
    DirectoryMtime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directories scanned for packages, highest precedence first.
    pub search_roots: Vec<PathBuf>,
    pub reserved_segments: Vec<String>,
    pub cache_path: PathBuf,
    pub staleness: StalenessCheck,
}

impl Config {
    pub fn new(search_roots: Vec<PathBuf>, cache_path: PathBuf) -> Self {
        Self {
            search_roots,
            reserved_segments: DEFAULT_RESERVED_SEGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cache_path,
            staleness: StalenessCheck::default(),
        }
    }

    /// Configuration derived from the process environment.
    pub fn from_env() -> Self {
        let roots = search_roots_from(env::var_os("GOPATH"), env::var_os("GOROOT"));
        let cache = env::var_os(CACHE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_path);
        Self::new(roots, cache)
    }

    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = roots;
        self
    }

    pub fn with_cache_path(mut self, path: PathBuf) -> Self {
        self.cache_path = path;
        self
    }

    pub fn with_staleness(mut self, staleness: StalenessCheck) -> Self {
        self.staleness = staleness;
        self
    }
}

/// Search roots for a `GOPATH` list and a `GOROOT`.
///
/// Every `GOPATH` entry is a root (its `src` directory is stripped as a
/// reserved segment). `GOROOT` contributes `src/pkg` on trees that still
/// have it, `src` otherwise.
pub fn search_roots_from(gopath: Option<OsString>, goroot: Option<OsString>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = gopath
        .iter()
        .flat_map(env::split_paths)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();

    if let Some(goroot) = goroot.filter(|g| !g.is_empty()) {
        let goroot = PathBuf::from(goroot);
        let legacy = goroot.join("src").join("pkg");
        if legacy.is_dir() {
            roots.push(legacy);
        } else {
            roots.push(goroot.join("src"));
        }
    }
    roots
}

/// `<user cache dir>/gofiximport/candidates.json`, falling back to
/// `~/.gofiximport/candidates.json`.
pub fn default_cache_path() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        return cache.join("gofiximport").join(CACHE_FILE_NAME);
    }
    let home = dirs::home_dir().unwrap_or_else(|| Path::new(".").to_path_buf());
    home.join(".gofiximport").join(CACHE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_gopath_entries_in_order() {
        let joined = env::join_paths(["/go/one", "/go/two"]).unwrap();
        let roots = search_roots_from(Some(joined), None);
        assert_eq!(roots, vec![PathBuf::from("/go/one"), PathBuf::from("/go/two")]);
    }

    #[test]
    fn test_goroot_modern_layout() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/fmt")).unwrap();
        let roots = search_roots_from(None, Some(tmp.path().as_os_str().to_owned()));
        assert_eq!(roots, vec![tmp.path().join("src")]);
    }

    #[test]
    fn test_goroot_legacy_layout() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/pkg/fmt")).unwrap();
        let roots = search_roots_from(None, Some(tmp.path().as_os_str().to_owned()));
        assert_eq!(roots, vec![tmp.path().join("src/pkg")]);
    }

    #[test]
    fn test_empty_environment() {
        assert!(search_roots_from(None, None).is_empty());
        assert!(search_roots_from(Some(OsString::new()), Some(OsString::new())).is_empty());
    }

    #[test]
    fn test_builders() {
        let config = Config::new(Vec::new(), PathBuf::from("c.json"))
            .with_search_roots(vec![PathBuf::from("/r")])
            .with_staleness(StalenessCheck::DirectoryMtime);
        assert_eq!(config.search_roots, vec![PathBuf::from("/r")]);
        assert_eq!(config.reserved_segments, vec!["src", "pkg"]);
        assert_eq!(config.staleness, StalenessCheck::DirectoryMtime);
    }
}
