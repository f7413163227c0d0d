//! Core data structures for the ontology graph engine.

pub mod entities;
pub mod errors;
pub mod identifiers;
pub mod records;
pub mod types;

// Re-export all common types
pub use entities::{
    ClassSignature, DatatypeProperty, EntityKind, ObjectInstance, ObjectProperty, OntologyClass,
    OntologyEntity, RelationDirection, SignatureObjectParam, SignatureParam,
};
pub use errors::{OntologyError, StoreError};
pub use identifiers::generate_uri;
pub use records::{GraphArc, GraphNode};
pub use types::{GraphRow, GraphValue, GraphValueMapExt};
