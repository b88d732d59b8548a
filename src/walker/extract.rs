//! Extraction pass for one open repository
//!
//! Repository first, then each branch with its edges, then every commit the
//! branch reaches. Each entity and each edge batch is its own write, so a
//! failure leaves the store valid but incomplete; re-running converges.

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, Level};

use crate::git::{ReaderError, RepositoryHandle};
use crate::mapper;
use crate::models::{Edge, EntityRecord};
use crate::store::{FactStore, StoreError};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to read repository: {0}")]
    Reader(#[from] ReaderError),

    #[error("failed to write facts: {0}")]
    Store(#[from] StoreError),
}

/// What one extraction pass wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub branches: usize,
    /// Commit visits, counting a commit once per branch that reaches it
    pub commit_visits: usize,
    /// Distinct commits
    pub commits: usize,
    /// Distinct authors
    pub users: usize,
    /// Edges written, including repeats across branches
    pub edges: usize,
}

/// Run the full extraction pass for `repo` into `store`.
pub fn extract<H, S>(repo: &H, store: &S) -> Result<ExtractionStats, ExtractError>
where
    H: RepositoryHandle + ?Sized,
    S: FactStore + ?Sized,
{
    let mut stats = ExtractionStats::default();
    let mut seen_commits: HashSet<String> = HashSet::new();
    let mut seen_users: HashSet<String> = HashSet::new();

    let repository = mapper::repository(repo.root());
    save_entity(store, &repository)?;

    for raw_branch in repo.branches()? {
        let branch = mapper::branch(&repository.key, &raw_branch);
        save_entity(store, &branch)?;
        stats.edges += save_edges(store, &mapper::branch_edges(&repository.key, &branch.key))?;
        stats.branches += 1;

        for raw_commit in repo.history(&raw_branch.head)? {
            let raw_commit = raw_commit?;
            let facts = mapper::commit_facts(&repository.key, &branch.key, &raw_commit);

            save_entity(store, &facts.commit)?;
            save_entity(store, &facts.user)?;
            stats.edges += save_edges(store, &facts.edges)?;

            stats.commit_visits += 1;
            seen_commits.insert(raw_commit.hash);
            seen_users.insert(raw_commit.author_email);
        }
    }

    stats.commits = seen_commits.len();
    stats.users = seen_users.len();
    Ok(stats)
}

/// Upsert an entity, echoing it back from the store when debug logging is on
fn save_entity<S: FactStore + ?Sized>(store: &S, record: &EntityRecord) -> Result<(), StoreError> {
    store.upsert_attributes(&record.key, &record.attributes)?;

    if tracing::enabled!(Level::DEBUG) {
        let saved = store.get_attributes(&record.key, &record.attribute_names())?;
        debug!(key = %record.key, attributes = ?saved, "Saved entity");
    }
    Ok(())
}

fn save_edges<S: FactStore + ?Sized>(store: &S, edges: &[Edge]) -> Result<usize, StoreError> {
    store.upsert_edges(edges)?;
    Ok(edges.len())
}
