//! Fact store for extracted entities and edges
//!
//! Two interchangeable backends sit behind [`FactStore`]:
//!
//! - [`RedbStore`]: durable, one redb table per entity kind
//! - [`MemoryStore`]: petgraph graph held in memory for the process lifetime
//!
//! All writes are blind upserts keyed by natural key. That is what makes
//! re-ingesting a repository idempotent without a reconciliation step.

pub mod durable;
pub mod memory;
pub mod schema;

pub use durable::RedbStore;
pub use memory::MemoryStore;
pub use schema::{AttributeSchema, RecordSchema, Schema};

use crate::models::{Attributes, Edge, EntityKey, EntityKind, Value, ValueType};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by fact store backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity kind {0} is not declared in the schema")]
    UndeclaredKind(EntityKind),

    #[error("unknown attribute '{attribute}' for {kind}")]
    UnknownAttribute { kind: EntityKind, attribute: String },

    #[error("attribute '{attribute}' of {kind} expects {expected}, got {actual}")]
    TypeMismatch {
        kind: EntityKind,
        attribute: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("database was initialized with a different schema (stored: {stored}, expected: {expected})")]
    SchemaMismatch { stored: String, expected: String },

    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt stored record: {0}")]
    Corrupt(String),

    #[error("{0} lock poisoned")]
    Poisoned(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! impl_from_redb {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StoreError {
                fn from(err: $err) -> Self {
                    StoreError::Database(err.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

pub type Result<T> = std::result::Result<T, StoreError>;

/// Entity and edge counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub entities: BTreeMap<EntityKind, usize>,
    pub edges: usize,
}

impl StoreStats {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.get(&kind).copied().unwrap_or(0)
    }
}

/// Key-addressed store with upsert-by-key writes and point reads.
pub trait FactStore: Send + Sync {
    /// Schema the store validates writes against
    fn schema(&self) -> &Schema;

    /// Last-write-wins per (entity, attribute). Either every attribute in the
    /// call is applied or none is.
    fn upsert_attributes(&self, key: &EntityKey, attributes: &[(&str, Value)]) -> Result<()>;

    /// Record each edge as an independent fact. Writing an edge that already
    /// exists is a no-op.
    fn upsert_edges(&self, edges: &[Edge]) -> Result<()>;

    /// Point read. Attributes the entity does not have are left out.
    fn get_attributes(&self, key: &EntityKey, names: &[&str]) -> Result<Attributes>;

    /// Keys of every stored entity of `kind`, sorted
    fn keys(&self, kind: EntityKind) -> Result<Vec<EntityKey>>;

    /// Every stored edge, sorted
    fn edges(&self) -> Result<Vec<Edge>>;

    fn stats(&self) -> Result<StoreStats> {
        let mut entities = BTreeMap::new();
        for kind in EntityKind::ALL {
            entities.insert(kind, self.keys(kind)?.len());
        }
        Ok(StoreStats {
            entities,
            edges: self.edges()?.len(),
        })
    }
}
