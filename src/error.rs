//! Errors surfaced by the fixer.
//!
//! Only failures concerning the target file are fatal. Problems with the
//! cache, sibling files or candidate directories are logged and recovered
//! from where they occur.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::base::{LineCol, LineIndex};
use crate::syntax::ParseError;

#[derive(Error, Debug)]
pub enum FixError {
    #[error("{}:{position}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        position: LineCol,
        message: String,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cache {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FixError {
    /// A parse error of `text`, positioned by line and column.
    pub fn parse(path: &Path, text: &str, err: ParseError) -> Self {
        FixError::Parse {
            path: path.to_path_buf(),
            position: LineIndex::new(text).line_col(err.offset),
            message: err.message,
        }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        FixError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FixError>;
