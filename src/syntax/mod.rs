//! Go source syntax: lexer, lossless tree and import-declaration rendering.
//!
//! ```text
//! lexer  → logos tokens (trivia included)
//!   ↓
//! parser → rowan green tree (package clause + import decls structured)
//!   ↓
//! ast    → typed wrappers
//!   ↓
//! format → editable ImportBlock, gofmt-style rendering
//! ```

pub mod ast;
pub mod format;
mod kind;
pub mod lexer;
mod parser;

pub use ast::{AstNode, ImportDecl, ImportSpec, PackageClause, SourceFile};
pub use format::{BlockItem, ImportBlock, SpecLine};
pub use kind::{GoLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
pub use parser::{Parse, ParseError, ParseMode, parse};
