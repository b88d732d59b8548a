//! Entity mapping
//!
//! Pure functions turning raw repository, branch and commit records into
//! typed entities and edges. Nothing here performs I/O; these rules are the
//! whole of the ingestion model.

use std::path::Path;

use crate::git::{RawBranch, RawCommit};
use crate::models::{Edge, EntityKey, EntityRecord, Relation};

/// Everything a single commit visit contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitFacts {
    pub commit: EntityRecord,
    pub user: EntityRecord,
    /// Repository↔Commit, Branch↔Commit and User↔Commit pairs
    pub edges: Vec<Edge>,
}

/// Repository entity, keyed by its absolute path
pub fn repository(root: &Path) -> EntityRecord {
    let path = root.to_string_lossy();
    EntityRecord::new(EntityKey::repository(&path)).with("path", &*path)
}

/// Branch entity, keyed within its repository
pub fn branch(repo: &EntityKey, raw: &RawBranch) -> EntityRecord {
    EntityRecord::new(EntityKey::branch(&repo.id, &raw.name))
        .with("name", raw.name.as_str())
        .with("head", raw.head.as_str())
}

pub fn commit(raw: &RawCommit) -> EntityRecord {
    EntityRecord::new(EntityKey::commit(&raw.hash))
        .with("hash", raw.hash.as_str())
        .with("email", raw.author_email.as_str())
        .with("message", raw.message.as_str())
        .with("created_at", raw.authored_at)
        .with("parent_count", raw.parent_count as i64)
}

/// Commit author, keyed by email
pub fn author(raw: &RawCommit) -> EntityRecord {
    EntityRecord::new(EntityKey::user(&raw.author_email))
        .with("name", raw.author_name.as_str())
        .with("email", raw.author_email.as_str())
}

/// Owner→child edge and its `belongs_to` inverse.
///
/// The forward relation follows from the child's kind; a child kind with no
/// owning relation yields no edges.
pub fn edge_pair(owner: &EntityKey, child: &EntityKey) -> Vec<Edge> {
    let Some(relation) = Relation::owning(child.kind) else {
        return Vec::new();
    };
    vec![
        Edge::new(owner.clone(), relation, child.clone()),
        Edge::new(child.clone(), Relation::BelongsTo, owner.clone()),
    ]
}

pub fn branch_edges(repo: &EntityKey, branch: &EntityKey) -> Vec<Edge> {
    edge_pair(repo, branch)
}

/// Facts for one commit reached from `branch` in `repo`
pub fn commit_facts(repo: &EntityKey, branch: &EntityKey, raw: &RawCommit) -> CommitFacts {
    let commit = commit(raw);
    let user = author(raw);

    let mut edges = Vec::with_capacity(6);
    edges.extend(edge_pair(repo, &commit.key));
    edges.extend(edge_pair(branch, &commit.key));
    edges.extend(edge_pair(&user.key, &commit.key));

    CommitFacts {
        commit,
        user,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityKind, Value};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn raw_commit(hash: &str) -> RawCommit {
        RawCommit {
            hash: hash.to_string(),
            author_name: "Ada Lovelace".to_string(),
            author_email: "ada@example.com".to_string(),
            message: "Add engine\n".to_string(),
            authored_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            parent_count: 1,
        }
    }

    #[test]
    fn test_repository_record() {
        let record = repository(&PathBuf::from("/src/engine"));
        assert_eq!(record.key, EntityKey::repository("/src/engine"));
        assert_eq!(record.get("path"), Some(&Value::from("/src/engine")));
        assert_eq!(record.attribute_names(), vec!["path"]);
    }

    #[test]
    fn test_branch_record() {
        let repo = EntityKey::repository("/src/engine");
        let raw = RawBranch {
            name: "main".into(),
            head: "c0ffee".into(),
        };
        let record = branch(&repo, &raw);
        assert_eq!(record.key.kind, EntityKind::Branch);
        assert_eq!(record.key.id, "/src/engine#main");
        assert_eq!(record.get("name"), Some(&Value::from("main")));
        assert_eq!(record.get("head"), Some(&Value::from("c0ffee")));
    }

    #[test]
    fn test_commit_record() {
        let record = commit(&raw_commit("abc"));
        assert_eq!(record.key, EntityKey::commit("abc"));
        assert_eq!(
            record.attribute_names(),
            vec!["hash", "email", "message", "created_at", "parent_count"]
        );
        assert_eq!(record.get("email"), Some(&Value::from("ada@example.com")));
        assert_eq!(record.get("message"), Some(&Value::from("Add engine\n")));
        assert_eq!(
            record.get("created_at").and_then(Value::as_timestamp),
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
        assert_eq!(record.get("parent_count"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_author_keyed_by_email() {
        let record = author(&raw_commit("abc"));
        assert_eq!(record.key, EntityKey::user("ada@example.com"));
        assert_eq!(record.get("name"), Some(&Value::from("Ada Lovelace")));
    }

    #[test]
    fn test_commit_key_is_stable_across_branches() {
        let repo = EntityKey::repository("/r");
        let main = EntityKey::branch("/r", "main");
        let dev = EntityKey::branch("/r", "dev");
        let raw = raw_commit("abc");

        let a = commit_facts(&repo, &main, &raw);
        let b = commit_facts(&repo, &dev, &raw);
        assert_eq!(a.commit, b.commit);
        assert_eq!(a.user, b.user);
        assert_ne!(a.edges, b.edges);
    }

    #[test]
    fn test_commit_facts_edges() {
        let repo = EntityKey::repository("/r");
        let main = EntityKey::branch("/r", "main");
        let facts = commit_facts(&repo, &main, &raw_commit("abc"));
        let c = EntityKey::commit("abc");
        let u = EntityKey::user("ada@example.com");

        assert_eq!(
            facts.edges,
            vec![
                Edge::new(repo.clone(), Relation::HasCommit, c.clone()),
                Edge::new(c.clone(), Relation::BelongsTo, repo),
                Edge::new(main.clone(), Relation::HasCommit, c.clone()),
                Edge::new(c.clone(), Relation::BelongsTo, main),
                Edge::new(u.clone(), Relation::HasCommit, c.clone()),
                Edge::new(c, Relation::BelongsTo, u),
            ]
        );
    }

    #[test]
    fn test_every_edge_has_its_inverse() {
        let repo = EntityKey::repository("/r");
        let main = EntityKey::branch("/r", "main");
        let mut edges = branch_edges(&repo, &main);
        edges.extend(commit_facts(&repo, &main, &raw_commit("abc")).edges);

        let set: HashSet<&Edge> = edges.iter().collect();
        for edge in &edges {
            let inverse = edge.inverse().expect("inverse exists");
            assert!(set.contains(&inverse), "missing inverse of {edge}");
        }
    }

    #[test]
    fn test_edge_pair_without_owning_relation() {
        let repo = EntityKey::repository("/r");
        assert!(edge_pair(&repo, &EntityKey::user("a@b")).is_empty());
    }
}
