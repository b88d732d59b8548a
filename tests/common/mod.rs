//! Shared fixtures: git repositories built with git2 and store dumps
#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::path::Path;

use gitwalk::models::{Attributes, Edge, EntityKey, EntityKind};
use gitwalk::store::FactStore;

/// Base author timestamp; each commit adds its own offset
const EPOCH: i64 = 1_700_000_000;

pub fn init_repo(path: &Path) -> Repository {
    std::fs::create_dir_all(path).unwrap();
    Repository::init(path).unwrap()
}

/// Commit an empty tree onto `refname`
pub fn commit(
    repo: &Repository,
    refname: &str,
    author: (&str, &str),
    message: &str,
    offset: i64,
    parents: &[Oid],
) -> Oid {
    let sig = Signature::new(author.0, author.1, &Time::new(EPOCH + offset, 0)).unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parents: Vec<_> = parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
    let parent_refs: Vec<_> = parents.iter().collect();
    repo.commit(Some(refname), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Point a new local branch at an existing commit
pub fn branch_at(repo: &Repository, name: &str, target: Oid) {
    let commit = repo.find_commit(target).unwrap();
    repo.branch(name, &commit, false).unwrap();
}

pub const ADA: (&str, &str) = ("Ada Lovelace", "ada@example.com");
pub const GRACE: (&str, &str) = ("Grace Hopper", "grace@example.com");

/// Commits written by [`two_repositories`]
pub struct TwoRepos {
    pub r1_commits: [Oid; 2],
    pub r2_commit: Oid,
}

/// R1 with `main` holding two commits, R2 with `main` and `dev` on one commit,
/// both under `root/projects` next to a plain directory.
pub fn two_repositories(root: &Path) -> TwoRepos {
    std::fs::create_dir_all(root.join("docs/notes")).unwrap();
    std::fs::write(root.join("docs/notes/readme.txt"), "not a repository").unwrap();

    let r1 = init_repo(&root.join("projects/r1"));
    let first = commit(&r1, "refs/heads/main", ADA, "r1: initial", 0, &[]);
    let second = commit(&r1, "refs/heads/main", GRACE, "r1: second", 60, &[first]);

    let r2 = init_repo(&root.join("projects/r2"));
    let shared = commit(&r2, "refs/heads/main", GRACE, "r2: initial", 120, &[]);
    branch_at(&r2, "dev", shared);

    TwoRepos {
        r1_commits: [first, second],
        r2_commit: shared,
    }
}

pub fn repo_key(path: &Path) -> EntityKey {
    EntityKey::repository(&path.canonicalize().unwrap().to_string_lossy())
}

/// Every entity with all of its schema attributes, plus every edge
pub fn dump(store: &dyn FactStore) -> (Vec<(EntityKey, Attributes)>, Vec<Edge>) {
    let mut entities = Vec::new();
    for kind in EntityKind::ALL {
        let names: Vec<&str> = store
            .schema()
            .record(kind)
            .unwrap()
            .attributes
            .iter()
            .map(|a| a.name)
            .collect();
        for key in store.keys(kind).unwrap() {
            let attrs = store.get_attributes(&key, &names).unwrap();
            entities.push((key, attrs));
        }
    }
    (entities, store.edges().unwrap())
}
