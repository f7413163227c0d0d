//! Core traits (interfaces) for the ontology graph engine.

pub mod graph_engine;
pub mod graph_store;

pub use graph_engine::{GraphEngine, Statement};
pub use graph_store::{ArcDirection, GraphStore};
