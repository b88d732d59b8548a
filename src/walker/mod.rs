//! Directory walker
//!
//! Traverses a directory tree depth-first, treats every directory that opens
//! as a repository as a leaf (repositories are not searched for nested
//! repositories), and runs one extraction pass per repository found.
//!
//! # Failure policy
//!
//! By default the first failure aborts the walk. With
//! [`WalkOptions::keep_going`] failures are recorded per repository and the
//! walk continues; the [`WalkReport`] lists both outcomes.
//!
//! # Example
//!
//! ```no_run
//! use gitwalk::git::GitReader;
//! use gitwalk::store::MemoryStore;
//! use gitwalk::walker::{TracingObserver, Walker};
//! use std::path::Path;
//!
//! let store = MemoryStore::default();
//! let report = Walker::new(&GitReader::new(), &store, &TracingObserver)
//!     .walk(Path::new("/path/to/projects"))
//!     .unwrap();
//! println!("{} repositories ingested", report.succeeded.len());
//! ```

mod extract;
mod observer;

pub use extract::{extract, ExtractError, ExtractionStats};
pub use observer::{TracingObserver, WalkObserver};

use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::git::{OpenError, RepositoryHandle, RepositoryReader};
use crate::store::FactStore;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("root path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("root path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to traverse {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error("extraction failed for {}: {source}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Walk behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Extraction passes run in parallel on this many threads
    pub workers: usize,
    /// Record per-repository failures and continue instead of aborting
    pub keep_going: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            keep_going: false,
        }
    }
}

/// A successfully ingested repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub path: PathBuf,
    pub stats: ExtractionStats,
}

/// A directory or repository that could not be processed
#[derive(Debug)]
pub struct RepoFailure {
    pub path: PathBuf,
    pub error: WalkError,
}

/// Aggregate outcome of a walk
#[derive(Debug, Default)]
pub struct WalkReport {
    pub succeeded: Vec<ExtractionSummary>,
    pub failed: Vec<RepoFailure>,
}

impl WalkReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded_paths(&self) -> Vec<&Path> {
        self.succeeded.iter().map(|s| s.path.as_path()).collect()
    }
}

/// Check that `root` exists and is a directory.
pub fn check_root(root: &Path) -> Result<(), WalkError> {
    match std::fs::metadata(root) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(WalkError::RootNotFound(root.to_path_buf()))
        }
        Err(source) => Err(WalkError::Io {
            path: root.to_path_buf(),
            source,
        }),
        Ok(meta) if !meta.is_dir() => Err(WalkError::NotADirectory(root.to_path_buf())),
        Ok(_) => Ok(()),
    }
}

/// Drives reader → mapper → store over a directory tree.
pub struct Walker<'a, R, S: ?Sized> {
    reader: &'a R,
    store: &'a S,
    observer: &'a dyn WalkObserver,
    options: WalkOptions,
}

impl<'a, R, S> Walker<'a, R, S>
where
    R: RepositoryReader,
    S: FactStore + ?Sized,
{
    pub fn new(reader: &'a R, store: &'a S, observer: &'a dyn WalkObserver) -> Self {
        Self {
            reader,
            store,
            observer,
            options: WalkOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Walk `root` and ingest every repository beneath it.
    pub fn walk(&self, root: &Path) -> Result<WalkReport, WalkError> {
        check_root(root)?;

        let mut report = WalkReport::default();
        let repos = self.discover(root, &mut report)?;
        debug!("Found {} repositories under {}", repos.len(), root.display());

        for result in self.run_passes(&repos)? {
            match result {
                Ok(summary) => report.succeeded.push(summary),
                Err(failure) => report.failed.push(failure),
            }
        }
        Ok(report)
    }

    /// Find repository roots without descending into them.
    fn discover(&self, root: &Path, report: &mut WalkReport) -> Result<Vec<PathBuf>, WalkError> {
        let mut repos = Vec::new();
        // Symlinks are never followed
        let mut entries = WalkDir::new(root).follow_links(false).into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source.path().unwrap_or(root).to_path_buf();
                    let error = WalkError::Traversal {
                        path: path.clone(),
                        source,
                    };
                    self.fail(report, path, error)?;
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            match self.reader.open(entry.path()) {
                Ok(repo) => {
                    self.observer.repository_found(repo.root());
                    repos.push(entry.path().to_path_buf());
                    entries.skip_current_dir();
                }
                Err(OpenError::NotARepository(_)) => {}
                Err(err) => {
                    // A broken repository is still a repository boundary
                    entries.skip_current_dir();
                    self.fail(report, entry.path().to_path_buf(), err.into())?;
                }
            }
        }

        Ok(repos)
    }

    /// Record a failure, or abort the walk with it.
    fn fail(
        &self,
        report: &mut WalkReport,
        path: PathBuf,
        error: WalkError,
    ) -> Result<(), WalkError> {
        self.observer.extraction_failed(&path, &error);
        if !self.options.keep_going {
            return Err(error);
        }
        report.failed.push(RepoFailure { path, error });
        Ok(())
    }

    fn run_passes(
        &self,
        repos: &[PathBuf],
    ) -> Result<Vec<Result<ExtractionSummary, RepoFailure>>, WalkError> {
        let keep_going = self.options.keep_going;

        if self.options.workers <= 1 {
            let mut results = Vec::with_capacity(repos.len());
            for path in repos {
                match self.process(path) {
                    Ok(summary) => results.push(Ok(summary)),
                    Err(failure) if keep_going => results.push(Err(failure)),
                    Err(failure) => return Err(failure.error),
                }
            }
            return Ok(results);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()?;

        pool.install(|| {
            if keep_going {
                Ok(repos.par_iter().map(|path| self.process(path)).collect())
            } else {
                let done: Vec<ExtractionSummary> = repos
                    .par_iter()
                    .map(|path| self.process(path).map_err(|failure| failure.error))
                    .collect::<Result<_, _>>()?;
                Ok(done.into_iter().map(Ok).collect())
            }
        })
    }

    /// One extraction pass. The repository handle is released when this returns.
    fn process(&self, path: &Path) -> Result<ExtractionSummary, RepoFailure> {
        let result = self
            .reader
            .open(path)
            .map_err(WalkError::from)
            .and_then(|repo| {
                let stats = extract(&repo, self.store).map_err(|source| WalkError::Extraction {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(ExtractionSummary {
                    path: repo.root().to_path_buf(),
                    stats,
                })
            });

        match result {
            Ok(summary) => {
                self.observer.extraction_completed(&summary);
                Ok(summary)
            }
            Err(error) => {
                self.observer.extraction_failed(path, &error);
                Err(RepoFailure {
                    path: path.to_path_buf(),
                    error,
                })
            }
        }
    }
}
