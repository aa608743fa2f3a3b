//! Foundation types shared by every layer.
//!
//! - [`TextRange`], [`TextSize`] - byte positions in a source file
//! - [`LineCol`], [`LineIndex`] - line/column conversion for diagnostics
//!
//! This module has NO dependencies on other gofiximport modules.

mod span;

pub use span::{LineCol, LineIndex, TextRange, TextSize};
