//! Durable fact store on redb
//!
//! One table per entity kind (named by the schema), keyed by natural key,
//! holding the entity's attribute map as JSON. Edges live in a single table
//! keyed by `(from, relation, to)`. Every trait call is one write
//! transaction, so a call is applied entirely or not at all.

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{FactStore, Result, Schema, StoreError};
use crate::models::{Attributes, Edge, EntityKey, EntityKind, Value};

const META_TABLE: TableDefinition<&str, &str> = TableDefinition::new("meta");
const EDGES_TABLE: TableDefinition<(&str, &str, &str), ()> = TableDefinition::new("edges");

const SCHEMA_KEY: &str = "schema";

fn entity_table(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// redb-backed store
pub struct RedbStore {
    db: Database,
    schema: Schema,
    path: PathBuf,
}

impl RedbStore {
    /// Create or open a database file and run the one-time initialization.
    pub fn open(path: &Path, schema: Schema) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)?;
        let store = Self {
            db,
            schema,
            path: path.to_path_buf(),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declare every table and record the schema on first use.
    ///
    /// A database created with a different schema is refused; there is no
    /// migration path.
    fn initialize(&self) -> Result<()> {
        let expected = self.schema.fingerprint()?;

        let txn = self.db.begin_write()?;
        {
            let mut meta = txn.open_table(META_TABLE)?;
            let stored = meta.get(SCHEMA_KEY)?.map(|v| v.value().to_string());
            match stored {
                Some(stored) if stored != expected => {
                    return Err(StoreError::SchemaMismatch { stored, expected });
                }
                Some(_) => {}
                None => {
                    debug!("Initializing fact store at {}", self.path.display());
                    meta.insert(SCHEMA_KEY, expected.as_str())?;
                }
            }

            for record in &self.schema.records {
                txn.open_table(entity_table(record.table))?;
            }
            txn.open_table(EDGES_TABLE)?;
        }
        txn.commit()?;

        Ok(())
    }

    fn table_name(&self, kind: EntityKind) -> Result<&'static str> {
        Ok(self.schema.record(kind)?.table)
    }

    /// Give an edge endpoint an (empty) row if it has none yet.
    fn ensure_entity(&self, txn: &WriteTransaction, key: &EntityKey) -> Result<()> {
        let mut table = txn.open_table(entity_table(self.table_name(key.kind)?))?;
        let exists = table.get(key.id.as_str())?.is_some();
        if !exists {
            let empty = serde_json::to_vec(&Attributes::new())?;
            table.insert(key.id.as_str(), empty.as_slice())?;
        }
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<Attributes> {
    Ok(serde_json::from_slice(bytes)?)
}

impl FactStore for RedbStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn upsert_attributes(&self, key: &EntityKey, attributes: &[(&str, Value)]) -> Result<()> {
        let record = self.schema.validate(key, attributes)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(entity_table(record.table))?;
            let mut current = match table.get(key.id.as_str())? {
                Some(existing) => decode(existing.value())?,
                None => Attributes::new(),
            };
            for (name, value) in attributes {
                current.insert(name.to_string(), value.clone());
            }
            let bytes = serde_json::to_vec(&current)?;
            table.insert(key.id.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;

        Ok(())
    }

    fn upsert_edges(&self, edges: &[Edge]) -> Result<()> {
        for edge in edges {
            self.schema.record(edge.from.kind)?;
            self.schema.record(edge.to.kind)?;
        }

        let txn = self.db.begin_write()?;
        for edge in edges {
            self.ensure_entity(&txn, &edge.from)?;
            self.ensure_entity(&txn, &edge.to)?;
        }
        {
            let mut table = txn.open_table(EDGES_TABLE)?;
            for edge in edges {
                let from = edge.from.to_string();
                let to = edge.to.to_string();
                table.insert((from.as_str(), edge.relation.as_str(), to.as_str()), ())?;
            }
        }
        txn.commit()?;

        Ok(())
    }

    fn get_attributes(&self, key: &EntityKey, names: &[&str]) -> Result<Attributes> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(entity_table(self.table_name(key.kind)?))?;
        let Some(row) = table.get(key.id.as_str())? else {
            return Ok(Attributes::new());
        };
        let mut attributes = decode(row.value())?;
        attributes.retain(|name, _| names.contains(&name.as_str()));
        Ok(attributes)
    }

    fn keys(&self, kind: EntityKind) -> Result<Vec<EntityKey>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(entity_table(self.table_name(kind)?))?;
        let mut keys = Vec::new();
        for item in table.iter()? {
            let (id, _) = item?;
            keys.push(EntityKey::new(kind, id.value()));
        }
        Ok(keys)
    }

    fn edges(&self) -> Result<Vec<Edge>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(EDGES_TABLE)?;
        let mut edges = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            let (from, relation, to) = key.value();
            edges.push(Edge::new(
                from.parse().map_err(StoreError::Corrupt)?,
                relation.parse().map_err(StoreError::Corrupt)?,
                to.parse().map_err(StoreError::Corrupt)?,
            ));
        }
        edges.sort();
        Ok(edges)
    }
}
