//! Error types for the ontology graph engine.

use thiserror::Error;

/// Storage-layer error for graph engine interaction.
///
/// "Not found" is never an error at this layer; read operations return
/// `None` or an empty collection instead.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Graph engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("Graph query execution error: {0}")]
    QueryError(String),
    #[error("Data mapping error from graph result: {0}")]
    MappingError(String),
    #[error("Transaction error: {0}")]
    TransactionError(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Domain-layer error for ontology operations.
///
/// Storage failures propagate through unchanged; the only condition raised
/// by the domain itself is a subclass hierarchy cycle discovered during
/// closure traversal.
#[derive(Error, Debug)]
pub enum OntologyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Subclass hierarchy cycle detected at `{uri}`")]
    CycleDetected { uri: String },
}
