//! # gofiximport
//!
//! Fixes the import declarations of a Go source file: package qualifiers
//! that bind to nothing get an import, imports nothing uses are removed.
//! Candidate packages come from an index of the local search roots (GOPATH,
//! GOROOT) that is cached on disk and rebuilt when the roots change.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! fix      → end-to-end pass: parse, plan, rewrite
//!   ↓
//! project  → directory walker, package indexer, cache, sibling files
//!   ↓
//! hir      → name analysis, candidate index, import resolution
//!   ↓
//! syntax   → logos lexer, rowan tree, import-block rendering
//!   ↓
//! base     → primitives (text ranges, line/column)
//! ```

/// Foundation types: text ranges and line/column conversion
pub mod base;

/// Go lexer, lossless parser and import-declaration formatter
pub mod syntax;

/// Name analysis, candidate index and import resolution
pub mod hir;

/// File-system facing components: walker, indexer, cache, siblings
pub mod project;

/// End-to-end import fixing
pub mod fix;

pub mod config;
pub mod error;

pub use base::{LineCol, LineIndex, TextRange, TextSize};
pub use config::{Config, StalenessCheck};
pub use error::{FixError, Result};
pub use fix::{Fixed, Fixer};
pub use hir::{CandidateIndex, ImportPlan};
pub use project::CacheManager;
