//! Walk notifications
//!
//! The walker reports progress through an observer handed to it, not through
//! ambient global state, so callers and tests decide where events go.

use std::path::Path;
use tracing::{info, warn};

use super::{ExtractionSummary, WalkError};

/// Receives one notification per repository processed.
pub trait WalkObserver: Send + Sync {
    /// A repository root was found during traversal
    fn repository_found(&self, _path: &Path) {}

    /// An extraction pass finished and its facts are stored
    fn extraction_completed(&self, summary: &ExtractionSummary);

    /// A directory or repository could not be processed
    fn extraction_failed(&self, path: &Path, error: &WalkError);
}

/// Observer that emits tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl WalkObserver for TracingObserver {
    fn extraction_completed(&self, summary: &ExtractionSummary) {
        let stats = &summary.stats;
        info!(
            repo = %summary.path.display(),
            branches = stats.branches,
            commits = stats.commits,
            users = stats.users,
            edges = stats.edges,
            "Saved commits"
        );
    }

    fn extraction_failed(&self, path: &Path, error: &WalkError) {
        warn!(repo = %path.display(), "Extraction failed: {}", error);
    }
}
