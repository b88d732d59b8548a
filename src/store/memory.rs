//! In-memory fact store on a petgraph directed graph
//!
//! Entities are nodes, edges are relation-labelled graph edges. Nothing is
//! persisted; the store lives as long as the process.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{FactStore, Result, Schema, StoreError};
use crate::models::{Attributes, Edge, EntityKey, EntityKind, Relation, Value};

#[derive(Debug, Clone)]
struct Node {
    key: EntityKey,
    attributes: Attributes,
}

#[derive(Default)]
struct Graph {
    graph: DiGraph<Node, Relation>,
    /// Node lookup by natural key
    index: HashMap<EntityKey, NodeIndex>,
}

impl Graph {
    /// Node for `key`, created empty on first sight
    fn ensure_node(&mut self, key: &EntityKey) -> NodeIndex {
        if let Some(&idx) = self.index.get(key) {
            return idx;
        }
        let idx = self.graph.add_node(Node {
            key: key.clone(),
            attributes: Attributes::new(),
        });
        self.index.insert(key.clone(), idx);
        idx
    }

    fn has_edge(&self, from: NodeIndex, relation: Relation, to: NodeIndex) -> bool {
        self.graph
            .edges_connecting(from, to)
            .any(|e| *e.weight() == relation)
    }
}

/// Graph-backed store with no persistence
pub struct MemoryStore {
    schema: Schema,
    // Graph and index share one lock so they can never disagree
    inner: RwLock<Graph>,
}

impl MemoryStore {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            inner: RwLock::new(Graph::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Graph>> {
        self.inner.read().map_err(|_| StoreError::Poisoned("graph"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Graph>> {
        self.inner.write().map_err(|_| StoreError::Poisoned("graph"))
    }

    pub fn node_count(&self) -> Result<usize> {
        Ok(self.read()?.graph.node_count())
    }

    pub fn edge_count(&self) -> Result<usize> {
        Ok(self.read()?.graph.edge_count())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Schema::gitwalk())
    }
}

impl FactStore for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn upsert_attributes(&self, key: &EntityKey, attributes: &[(&str, Value)]) -> Result<()> {
        self.schema.validate(key, attributes)?;

        let mut inner = self.write()?;
        let idx = inner.ensure_node(key);
        let node = &mut inner.graph[idx];
        for (name, value) in attributes {
            node.attributes.insert(name.to_string(), value.clone());
        }
        Ok(())
    }

    fn upsert_edges(&self, edges: &[Edge]) -> Result<()> {
        for edge in edges {
            self.schema.record(edge.from.kind)?;
            self.schema.record(edge.to.kind)?;
        }

        let mut inner = self.write()?;
        for edge in edges {
            let from = inner.ensure_node(&edge.from);
            let to = inner.ensure_node(&edge.to);
            if !inner.has_edge(from, edge.relation, to) {
                inner.graph.add_edge(from, to, edge.relation);
            }
        }
        Ok(())
    }

    fn get_attributes(&self, key: &EntityKey, names: &[&str]) -> Result<Attributes> {
        let inner = self.read()?;
        let Some(&idx) = inner.index.get(key) else {
            return Ok(Attributes::new());
        };
        let node = &inner.graph[idx];
        Ok(names
            .iter()
            .filter_map(|name| {
                node.attributes
                    .get(*name)
                    .map(|v| (name.to_string(), v.clone()))
            })
            .collect())
    }

    fn keys(&self, kind: EntityKind) -> Result<Vec<EntityKey>> {
        let inner = self.read()?;
        let mut keys: Vec<EntityKey> = inner
            .graph
            .node_weights()
            .filter(|n| n.key.kind == kind)
            .map(|n| n.key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn edges(&self) -> Result<Vec<Edge>> {
        let inner = self.read()?;
        let graph = &inner.graph;
        let mut edges: Vec<Edge> = graph
            .edge_references()
            .map(|e| {
                Edge::new(
                    graph[e.source()].key.clone(),
                    *e.weight(),
                    graph[e.target()].key.clone(),
                )
            })
            .collect();
        edges.sort();
        Ok(edges)
    }
}
