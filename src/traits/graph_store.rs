//! Generic CRUD and traversal contract over the property graph.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::data::errors::StoreError;
use crate::data::records::{GraphArc, GraphNode};
use crate::data::types::{GraphRow, GraphValue};
use crate::traits::graph_engine::Statement;

/// Traversal direction relative to the anchor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    Outgoing,
    Incoming,
}

/// Storage primitives the ontology layer is built on.
///
/// Read operations never fail on "not found": they return `None` or an
/// empty collection. Write operations may fail with
/// [`StoreError::EngineUnavailable`] or [`StoreError::ConstraintViolation`].
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Creates one node. When `properties` lacks a `uri` the identity
    /// allocator supplies one.
    async fn create_node(
        &self,
        properties: HashMap<String, GraphValue>,
        labels: &[String],
    ) -> Result<GraphNode, StoreError>;

    /// Exact match on the `uri` property.
    async fn get_node_by_uri(&self, uri: &str) -> Result<Option<GraphNode>, StoreError>;

    /// Merges `properties` onto the node: new values overwrite old for
    /// matching keys, other keys are untouched. Properties cannot be
    /// removed, only overwritten.
    async fn update_node(
        &self,
        uri: &str,
        properties: HashMap<String, GraphValue>,
    ) -> Result<Option<GraphNode>, StoreError>;

    /// Removes the node and every arc touching it; returns whether a node
    /// was found.
    async fn delete_node_by_uri(&self, uri: &str) -> Result<bool, StoreError>;

    /// Type-guarded delete: removes the node only when it carries `label`,
    /// otherwise a no-op returning `false`.
    async fn delete_node_with_label(&self, uri: &str, label: &str) -> Result<bool, StoreError>;

    /// Detach-deletes every listed uri, in order, as one atomic unit.
    /// Absent uris are skipped; returns how many nodes were deleted.
    async fn delete_nodes_by_uris(&self, uris: &[String]) -> Result<usize, StoreError>;

    /// Scan restricted to nodes carrying ALL given labels. An empty label
    /// list returns every node in the graph; callers must treat that as a
    /// potentially expensive full scan.
    async fn get_nodes_by_labels(&self, labels: &[String]) -> Result<Vec<GraphNode>, StoreError>;

    /// Materializes every node with its outgoing arcs populated; isolated
    /// nodes are included with an empty arc list. Rows are grouped by uri
    /// and the first-seen value for a uri wins, so the result is
    /// load-order dependent when rows disagree.
    async fn get_all_nodes_and_arcs(&self) -> Result<Vec<GraphNode>, StoreError>;

    /// Creates exactly one arc between two existing nodes, or returns
    /// `None` without side effects when either endpoint is missing.
    /// Duplicate arcs of the same type between the same endpoints are
    /// permitted and accumulate.
    async fn create_arc(
        &self,
        from_uri: &str,
        to_uri: &str,
        arc_type: &str,
        properties: HashMap<String, GraphValue>,
    ) -> Result<Option<GraphArc>, StoreError>;

    /// Removes one arc by its engine-local identifier; returns whether
    /// anything was deleted.
    async fn delete_arc_by_id(&self, arc_id: i64) -> Result<bool, StoreError>;

    /// One-hop traversal along `arc_type` from the node at `uri`,
    /// optionally restricted to neighbors carrying `neighbor_label`.
    /// Returns the distinct neighbor set.
    async fn get_neighbors(
        &self,
        uri: &str,
        arc_type: &str,
        direction: ArcDirection,
        neighbor_label: Option<&str>,
    ) -> Result<Vec<GraphNode>, StoreError>;

    /// Label scan filtered by one property equality.
    async fn get_nodes_by_property(
        &self,
        label: &str,
        key: &str,
        value: &GraphValue,
    ) -> Result<Vec<GraphNode>, StoreError>;

    /// Label scan filtered by property membership in `values`.
    async fn get_nodes_by_property_in(
        &self,
        label: &str,
        key: &str,
        values: &[String],
    ) -> Result<Vec<GraphNode>, StoreError>;

    /// Nodes carrying `label` with no outgoing `arc_type` arc to another
    /// node of the same label.
    async fn get_root_nodes(&self, label: &str, arc_type: &str)
        -> Result<Vec<GraphNode>, StoreError>;

    /// Low-level escape hatch: runs one raw statement and returns its rows
    /// with node/relationship values normalized to plain mappings.
    async fn run_raw(&self, statement: Statement) -> Result<Vec<GraphRow>, StoreError>;
}
