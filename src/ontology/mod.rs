//! The ontology domain layer.

pub mod engine;

pub use engine::OntologyEngine;
