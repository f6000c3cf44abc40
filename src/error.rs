// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Conflicting or incomplete options; reported before anything is touched.
    #[error("{0}")]
    Config(String),

    #[error("no git repository found at or above {}", .0.display())]
    NoRepository(PathBuf),

    #[error("repository has no working tree")]
    BareRepository,

    /// A malformed line in the text stamp file. Line numbers are 0-based.
    #[error("stamp file line {line}: {reason}")]
    StampLine { line: usize, reason: String },

    #[error("stamp tree has no entry for '{0}'")]
    PrefixNotFound(String),

    #[error("malformed stamp tree: {0}")]
    TreeDecode(String),

    #[error("commit {0} has an out-of-range timestamp")]
    CommitTime(git2::Oid),

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
