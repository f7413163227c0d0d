//! Ontology modeling and storage engine over a labeled property graph.
//!
//! Classes, typed properties, and instances are plain labeled nodes; the
//! [`OntologyEngine`] owns the arc discipline between them and the
//! structural operations built on it (hierarchy traversal, cascading
//! deletion, signature derivation). Storage goes through the
//! [`GraphStore`] trait with an embedded in-memory backend and a
//! Cypher-emitting backend over any [`GraphEngine`].

// Core modules
pub mod data;
pub mod ontology;
pub mod storage;
pub mod traits;

// Implementation adapters (optional, can be provided externally)
#[cfg(feature = "adapters")]
pub mod adapters;

// Testing utilities
pub mod test_utils;

// Re-export key types for convenient usage
pub use data::entities::{
    arcs, ClassSignature, DatatypeProperty, EntityKind, ObjectInstance, ObjectProperty,
    OntologyClass, OntologyEntity, RelationDirection, SignatureObjectParam, SignatureParam,
};
pub use data::errors::{OntologyError, StoreError};
pub use data::identifiers::generate_uri;
pub use data::records::{GraphArc, GraphNode, URI_KEY};
pub use data::types::{GraphRow, GraphValue, GraphValueMapExt};

// Re-export core traits and their implementations
pub use ontology::OntologyEngine;
pub use storage::{CypherGraphStore, MemoryGraphStore};
pub use traits::{ArcDirection, GraphEngine, GraphStore, Statement};

#[cfg(feature = "adapters")]
pub use adapters::{Neo4jConfig, Neo4jGraphEngine};

/// Initialize tracing for the engine.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
