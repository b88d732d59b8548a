//! Git history extraction using libgit2
//!
//! Implements the repository reader contract with the git2 crate (Rust
//! bindings to libgit2).

use chrono::{TimeZone, Utc};
use git2::{BranchType, ErrorCode, Oid, Repository, Revwalk, Sort};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::reader::{
    CommitIter, OpenError, RawBranch, RawCommit, ReaderError, RepositoryHandle, RepositoryReader,
};

/// Reader backed by libgit2.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitReader;

impl GitReader {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryReader for GitReader {
    type Handle = GitHandle;

    fn open(&self, path: &Path) -> Result<GitHandle, OpenError> {
        // Repository::open never searches parent directories, unlike discover()
        let repo = Repository::open(path).map_err(|e| classify_open_error(path, &e))?;
        let root = path.canonicalize().map_err(|e| OpenError::PermissionDenied {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(GitHandle { repo, root })
    }
}

/// Sort a libgit2 open failure into the walker's error taxonomy.
///
/// libgit2 reports every directory it cannot recognise as `NotFound`, so the
/// `.git` marker is checked to tell a plain directory apart from an
/// unreadable or damaged repository.
fn classify_open_error(path: &Path, err: &git2::Error) -> OpenError {
    let marker = path.join(".git");
    match (err.code(), marker.symlink_metadata()) {
        (_, Err(io_err)) if io_err.kind() == io::ErrorKind::PermissionDenied => {
            OpenError::PermissionDenied {
                path: path.to_path_buf(),
                message: io_err.to_string(),
            }
        }
        (ErrorCode::NotFound, Err(_)) => OpenError::NotARepository(path.to_path_buf()),
        _ if err.class() == git2::ErrorClass::Os
            && err.message().to_lowercase().contains("permission denied") =>
        {
            OpenError::PermissionDenied {
                path: path.to_path_buf(),
                message: err.message().to_string(),
            }
        }
        _ => OpenError::Corrupted {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        },
    }
}

/// An open git repository.
pub struct GitHandle {
    repo: Repository,
    root: PathBuf,
}

impl RepositoryHandle for GitHandle {
    fn root(&self) -> &Path {
        &self.root
    }

    fn branches(&self) -> Result<Vec<RawBranch>, ReaderError> {
        let mut branches = Vec::new();
        for item in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = item?;
            let name = String::from_utf8_lossy(branch.name_bytes()?).into_owned();
            let head = branch
                .get()
                .resolve()?
                .target()
                .ok_or_else(|| ReaderError::UnresolvedBranch(name.clone()))?;
            branches.push(RawBranch {
                name,
                head: head.to_string(),
            });
        }
        Ok(branches)
    }

    fn history(&self, start: &str) -> Result<CommitIter<'_>, ReaderError> {
        let oid = Oid::from_str(start)?;
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        walk.push(oid)?;
        Ok(Box::new(CommitHistory {
            repo: &self.repo,
            walk,
        }))
    }
}

/// Lazy commit sequence over a revwalk.
struct CommitHistory<'r> {
    repo: &'r Repository,
    walk: Revwalk<'r>,
}

impl CommitHistory<'_> {
    fn read(&self, oid: Oid) -> Result<RawCommit, ReaderError> {
        let commit = self.repo.find_commit(oid)?;
        let author = commit.author();
        let seconds = author.when().seconds();
        let authored_at = Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            ReaderError::InvalidTimestamp {
                hash: oid.to_string(),
                seconds,
            }
        })?;

        Ok(RawCommit {
            hash: oid.to_string(),
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            authored_at,
            parent_count: commit.parent_count(),
        })
    }
}

impl Iterator for CommitHistory<'_> {
    type Item = Result<RawCommit, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.walk.next()?;
        Some(oid.map_err(ReaderError::from).and_then(|oid| self.read(oid)))
    }
}
