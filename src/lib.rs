//! gitwalk - ingest git history into a queryable fact store
//!
//! Walks a directory tree, finds git repositories, and records repositories,
//! branches, commits and authors as typed entities joined by bidirectional
//! edges.
//!
//! - [`git`] reads repositories through the [`git::RepositoryReader`] seam
//! - [`mapper`] turns raw records into entities and edges
//! - [`store`] holds the schema and both [`store::FactStore`] backends
//! - [`walker`] ties traversal, extraction and failure policy together

pub mod config;
pub mod git;
pub mod mapper;
pub mod models;
pub mod store;
pub mod walker;
