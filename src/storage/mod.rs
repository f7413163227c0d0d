//! Storage backends implementing the [`GraphStore`](crate::traits::GraphStore) trait.

pub mod cypher;
pub mod memory;

pub use cypher::CypherGraphStore;
pub use memory::MemoryGraphStore;
