//! Engine adapters for external graph backends.

pub mod neo4j_engine;

pub use neo4j_engine::{Neo4jConfig, Neo4jGraphEngine};
