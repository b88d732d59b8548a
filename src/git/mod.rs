//! Repository reading
//!
//! Opens directories as git repositories, enumerates local branches, and
//! walks commit history lazily.
//!
//! # Example
//!
//! ```no_run
//! use gitwalk::git::{GitReader, RepositoryHandle, RepositoryReader};
//! use std::path::Path;
//!
//! let repo = GitReader::new().open(Path::new("/path/to/repo")).unwrap();
//! for branch in repo.branches().unwrap() {
//!     for commit in repo.history(&branch.head).unwrap() {
//!         println!("{} {}", branch.name, commit.unwrap().hash);
//!     }
//! }
//! ```

pub mod history;
pub mod reader;

pub use history::{GitHandle, GitReader};
pub use reader::{
    CommitIter, OpenError, RawBranch, RawCommit, ReaderError, RepositoryHandle, RepositoryReader,
};
