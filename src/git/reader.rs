//! Repository reader contract
//!
//! The walker only sees repositories through these traits, which keeps
//! libgit2 out of the traversal and extraction logic and lets tests drive
//! the walker with in-memory repositories.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A local branch as enumerated by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBranch {
    /// Short branch name (`main`, not `refs/heads/main`)
    pub name: String,
    /// Full hash of the commit the branch points at
    pub head: String,
}

/// A commit as produced by a history walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,
    pub parent_count: usize,
}

/// Why a directory could not be opened as a repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// The expected case for ordinary directories; traversal continues into it.
    #[error("not a repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("permission denied opening {}: {message}", path.display())]
    PermissionDenied { path: PathBuf, message: String },

    #[error("corrupted repository at {}: {message}", path.display())]
    Corrupted { path: PathBuf, message: String },
}

impl OpenError {
    pub fn path(&self) -> &Path {
        match self {
            OpenError::NotARepository(path) => path,
            OpenError::PermissionDenied { path, .. } | OpenError::Corrupted { path, .. } => path,
        }
    }
}

/// Failure while reading an already opened repository.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("branch '{0}' does not resolve to a commit")]
    UnresolvedBranch(String),

    #[error("commit {hash} has an out-of-range author timestamp ({seconds})")]
    InvalidTimestamp { hash: String, seconds: i64 },

    #[error("{0}")]
    Other(String),
}

/// Lazy, single-pass commit sequence.
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<RawCommit, ReaderError>> + 'a>;

/// Opens directories as repositories.
pub trait RepositoryReader: Send + Sync {
    type Handle: RepositoryHandle;

    /// Open `path` itself as a repository root. Parent directories are never searched.
    fn open(&self, path: &Path) -> Result<Self::Handle, OpenError>;
}

/// An open repository. Dropping the handle releases it.
pub trait RepositoryHandle {
    /// Absolute path of the repository root
    fn root(&self) -> &Path;

    /// Local branches, in whatever order the underlying repository yields them
    fn branches(&self) -> Result<Vec<RawBranch>, ReaderError>;

    /// Commits reachable from `start`, newest first
    fn history(&self, start: &str) -> Result<CommitIter<'_>, ReaderError>;
}
