//! Core data models for gitwalk
//!
//! Entities are identified by natural keys derived from repository content,
//! so re-ingesting the same history always produces the same keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kinds of entity stored in the fact store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Repository,
    Branch,
    Commit,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Repository,
        EntityKind::Branch,
        EntityKind::Commit,
        EntityKind::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Repository => "Repository",
            EntityKind::Branch => "Branch",
            EntityKind::Commit => "Commit",
            EntityKind::User => "User",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Repository" => Ok(EntityKind::Repository),
            "Branch" => Ok(EntityKind::Branch),
            "Commit" => Ok(EntityKind::Commit),
            "User" => Ok(EntityKind::User),
            other => Err(format!("unknown entity kind '{}'", other)),
        }
    }
}

/// Identity of an entity: its kind plus its natural key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn repository(path: &str) -> Self {
        Self::new(EntityKind::Repository, path)
    }

    /// Branch names are only unique within a repository, so the key carries both.
    pub fn branch(repo_path: &str, name: &str) -> Self {
        Self::new(EntityKind::Branch, format!("{}#{}", repo_path, name))
    }

    pub fn commit(hash: &str) -> Self {
        Self::new(EntityKind::Commit, hash)
    }

    pub fn user(email: &str) -> Self {
        Self::new(EntityKind::User, email)
    }
}

/// Renders as `Kind:id`; the kind never contains a colon so the first one splits.
impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for EntityKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed entity key '{}'", s))?;
        Ok(Self::new(kind.parse()?, id))
    }
}

/// Declared type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Timestamp,
    Integer,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Text => write!(f, "text"),
            ValueType::Timestamp => write!(f, "timestamp"),
            ValueType::Integer => write!(f, "integer"),
        }
    }
}

/// Attribute value as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Text(String),
    Timestamp(DateTime<Utc>),
    Integer(i64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Integer(_) => ValueType::Integer,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

/// Attribute map as read back from a store
pub type Attributes = BTreeMap<String, Value>;

/// Relationship names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    HasBranch,
    HasCommit,
    BelongsTo,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::HasBranch => "has_branch",
            Relation::HasCommit => "has_commit",
            Relation::BelongsTo => "belongs_to",
        }
    }

    /// Relation an owner uses to point at a child of the given kind
    pub fn owning(child: EntityKind) -> Option<Relation> {
        match child {
            EntityKind::Branch => Some(Relation::HasBranch),
            EntityKind::Commit => Some(Relation::HasCommit),
            EntityKind::Repository | EntityKind::User => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "has_branch" => Ok(Relation::HasBranch),
            "has_commit" => Ok(Relation::HasCommit),
            "belongs_to" => Ok(Relation::BelongsTo),
            other => Err(format!("unknown relation '{}'", other)),
        }
    }
}

/// A directed, named relationship fact
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: EntityKey,
    pub relation: Relation,
    pub to: EntityKey,
}

impl Edge {
    pub fn new(from: EntityKey, relation: Relation, to: EntityKey) -> Self {
        Self { from, relation, to }
    }

    /// The reverse fact, if this relation has one.
    ///
    /// `belongs_to` points from child to owner, so its inverse is chosen by
    /// the kind of the child (`self.from`).
    pub fn inverse(&self) -> Option<Edge> {
        let relation = match self.relation {
            Relation::HasBranch | Relation::HasCommit => Relation::BelongsTo,
            Relation::BelongsTo => Relation::owning(self.from.kind)?,
        };
        Some(Edge::new(self.to.clone(), relation, self.from.clone()))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.from, self.relation, self.to)
    }
}

/// An entity's key together with the attributes to upsert
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub key: EntityKey,
    pub attributes: Vec<(&'static str, Value)>,
}

impl EntityRecord {
    pub fn new(key: EntityKey) -> Self {
        Self {
            key,
            attributes: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn attribute_names(&self) -> Vec<&'static str> {
        self.attributes.iter().map(|(n, _)| *n).collect()
    }
}
