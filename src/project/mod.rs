//! Everything that touches the file system around the target file.
//!
//! - [`walker`] - cycle-safe traversal of the search roots
//! - [`package_indexer`] - finds packages and builds the candidate index
//! - [`cache`] - persists the index and decides when to rebuild it
//! - [`sibling_loader`] - imports of the target's package siblings

pub mod cache;
pub mod package_indexer;
pub mod sibling_loader;
pub mod walker;

pub use cache::{CacheManager, CacheRecord, FORMAT_VERSION};
pub use package_indexer::{IndexedPackage, PackageIndexer};
pub use sibling_loader::SiblingLoader;
pub use walker::{PathWalker, Visitor, WalkControl, latest_modification};
