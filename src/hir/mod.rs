//! Semantic layer: what names a Go file uses and where they come from.
//!
//! - [`names`] - declared names and qualifier references of one file
//! - [`candidates`] - the candidate-package index
//! - [`resolve`] - turning unresolved qualifiers into an [`ImportPlan`]

pub mod candidates;
pub mod names;
pub mod resolve;

pub use candidates::{CandidateIndex, Candidates, short_name};
pub use names::{Binding, FileNames, ImportBinding, QualifierRef, assumed_name, last_segment};
pub use resolve::{
    Addition, ImportPlan, ImportResolver, Removal, ResolveResult, ResolveSource, SiblingImports,
};
