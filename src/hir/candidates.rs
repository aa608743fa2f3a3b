//! The candidate-package index: short package name → canonical paths.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::names::last_segment;

/// Result of looking up a short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates<'a> {
    Missing,
    Unique(&'a str),
    /// More than one package has this short name; sorted.
    Ambiguous(Vec<&'a str>),
}

/// Every package found under the search roots, grouped by short name.
///
/// Ordered collections keep lookups and the serialized cache deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateIndex {
    packages: BTreeMap<String, BTreeSet<String>>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the package at `canonical_path`. Empty paths are ignored.
    pub fn insert(&mut self, canonical_path: impl Into<String>) {
        let path = canonical_path.into();
        let short = short_name(&path);
        if short.is_empty() {
            return;
        }
        self.packages
            .entry(short.to_string())
            .or_default()
            .insert(path);
    }

    pub fn lookup(&self, short: &str) -> Candidates<'_> {
        let Some(paths) = self.packages.get(short) else {
            return Candidates::Missing;
        };
        let mut iter = paths.iter();
        match (iter.next(), iter.next()) {
            (Some(only), None) => Candidates::Unique(only),
            (None, _) => Candidates::Missing,
            _ => Candidates::Ambiguous(paths.iter().map(String::as_str).collect()),
        }
    }

    /// All paths registered under `short`.
    pub fn packages(&self, short: &str) -> impl Iterator<Item = &str> {
        self.packages
            .get(short)
            .into_iter()
            .flat_map(|paths| paths.iter().map(String::as_str))
    }

    /// Number of distinct short names.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Total number of packages across all short names.
    pub fn package_count(&self) -> usize {
        self.packages.values().map(BTreeSet::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.packages.iter().flat_map(|(short, paths)| {
            paths.iter().map(move |path| (short.as_str(), path.as_str()))
        })
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateIndex {
    fn from_iter<I: IntoIterator<Item = S>>(paths: I) -> Self {
        let mut index = Self::new();
        index.extend(paths);
        index
    }
}

impl<S: Into<String>> Extend<S> for CandidateIndex {
    fn extend<I: IntoIterator<Item = S>>(&mut self, paths: I) {
        for path in paths {
            self.insert(path);
        }
    }
}

/// Short name of a canonical package path: its last segment.
pub fn short_name(canonical_path: &str) -> &str {
    last_segment(canonical_path.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_unique_and_ambiguous() {
        let index: CandidateIndex = [
            "fmt",
            "encoding/json",
            "github.com/x/json",
            "github.com/x/json",
        ]
        .into_iter()
        .collect();

        assert_eq!(index.lookup("fmt"), Candidates::Unique("fmt"));
        assert_eq!(
            index.lookup("json"),
            Candidates::Ambiguous(vec!["encoding/json", "github.com/x/json"])
        );
        assert_eq!(index.lookup("os"), Candidates::Missing);
        assert_eq!(index.len(), 2);
        assert_eq!(index.package_count(), 3);
    }

    #[test]
    fn test_empty_path_ignored() {
        let mut index = CandidateIndex::new();
        index.insert("");
        assert!(index.is_empty());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let index: CandidateIndex = ["go/ast", "fmt"].into_iter().collect();
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"{"ast":["go/ast"],"fmt":["fmt"]}"#);
        let back: CandidateIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn test_iter_is_sorted() {
        let index: CandidateIndex = ["b/x", "a/x", "c"].into_iter().collect();
        let pairs: Vec<_> = index.iter().collect();
        assert_eq!(pairs, vec![("c", "c"), ("x", "a/x"), ("x", "b/x")]);
        assert_eq!(index.packages("x").collect::<Vec<_>>(), vec!["a/x", "b/x"]);
    }
}
