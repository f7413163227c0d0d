//! Embedded in-memory storage backend.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::data::errors::StoreError;
use crate::data::identifiers::generate_uri;
use crate::data::records::{GraphArc, GraphNode, URI_KEY};
use crate::data::types::{GraphRow, GraphValue};
use crate::traits::graph_engine::Statement;
use crate::traits::graph_store::{ArcDirection, GraphStore};

#[derive(Debug, Clone)]
struct NodeRecord {
    id: i64,
    labels: Vec<String>,
    properties: HashMap<String, GraphValue>,
}

#[derive(Debug, Clone)]
struct ArcRecord {
    id: i64,
    arc_type: String,
    from_uri: String,
    to_uri: String,
    properties: HashMap<String, GraphValue>,
}

#[derive(Default)]
struct GraphTables {
    nodes: BTreeMap<String, NodeRecord>,
    arcs: Vec<ArcRecord>,
    next_id: i64,
}

/// In-memory [`GraphStore`] implementation.
///
/// Keeps nodes keyed by uri and arcs in creation order behind one
/// read-write lock; every public call acquires and releases the lock on
/// all exit paths. Uri uniqueness is enforced here, so duplicate creates
/// fail with [`StoreError::ConstraintViolation`]. Engine-local ids come
/// from a monotonic counter and are meaningless outside this instance.
pub struct MemoryGraphStore {
    tables: Arc<RwLock<GraphTables>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(GraphTables::default())),
        }
    }

    fn to_node(uri: &str, record: &NodeRecord) -> GraphNode {
        GraphNode {
            id: Some(record.id),
            uri: uri.to_string(),
            labels: record.labels.clone(),
            properties: record.properties.clone(),
            arcs: Vec::new(),
        }
    }

    fn to_arc(record: &ArcRecord) -> GraphArc {
        GraphArc {
            id: Some(record.id),
            arc_type: record.arc_type.clone(),
            from_uri: record.from_uri.clone(),
            to_uri: record.to_uri.clone(),
            properties: record.properties.clone(),
        }
    }

    fn has_label(record: &NodeRecord, label: &str) -> bool {
        record.labels.iter().any(|l| l == label)
    }

    fn has_all_labels(record: &NodeRecord, labels: &[String]) -> bool {
        labels.iter().all(|label| Self::has_label(record, label))
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn create_node(
        &self,
        properties: HashMap<String, GraphValue>,
        labels: &[String],
    ) -> Result<GraphNode, StoreError> {
        let mut properties = properties;
        let uri = match properties.get(URI_KEY).and_then(|v| v.as_str()) {
            Some(uri) => uri.to_string(),
            None => {
                let uri = generate_uri();
                properties.insert(URI_KEY.to_string(), GraphValue::from(uri.clone()));
                uri
            }
        };

        let mut tables = self.tables.write().await;
        if tables.nodes.contains_key(&uri) {
            return Err(StoreError::ConstraintViolation(format!(
                "node with uri `{}` already exists",
                uri
            )));
        }
        tables.next_id += 1;
        let record = NodeRecord {
            id: tables.next_id,
            labels: labels.to_vec(),
            properties,
        };
        let node = Self::to_node(&uri, &record);
        tables.nodes.insert(uri.clone(), record);
        debug!(uri = %uri, "created node");
        Ok(node)
    }

    async fn get_node_by_uri(&self, uri: &str) -> Result<Option<GraphNode>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.nodes.get(uri).map(|record| Self::to_node(uri, record)))
    }

    async fn update_node(
        &self,
        uri: &str,
        properties: HashMap<String, GraphValue>,
    ) -> Result<Option<GraphNode>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.nodes.get_mut(uri) {
            Some(record) => {
                for (key, value) in properties {
                    record.properties.insert(key, value);
                }
                Ok(Some(Self::to_node(uri, record)))
            }
            None => Ok(None),
        }
    }

    async fn delete_node_by_uri(&self, uri: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let found = tables.nodes.remove(uri).is_some();
        if found {
            tables.arcs.retain(|a| a.from_uri != uri && a.to_uri != uri);
            debug!(uri = %uri, "deleted node and adjacent arcs");
        }
        Ok(found)
    }

    async fn delete_node_with_label(&self, uri: &str, label: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let guarded = tables
            .nodes
            .get(uri)
            .map(|record| Self::has_label(record, label))
            .unwrap_or(false);
        if !guarded {
            return Ok(false);
        }
        tables.nodes.remove(uri);
        tables.arcs.retain(|a| a.from_uri != uri && a.to_uri != uri);
        Ok(true)
    }

    async fn delete_nodes_by_uris(&self, uris: &[String]) -> Result<usize, StoreError> {
        // One write guard for the entire batch keeps it atomic.
        let mut tables = self.tables.write().await;
        let mut deleted = 0;
        for uri in uris {
            if tables.nodes.remove(uri).is_some() {
                tables.arcs.retain(|a| &a.from_uri != uri && &a.to_uri != uri);
                deleted += 1;
            }
        }
        debug!(requested = uris.len(), deleted, "batch delete applied");
        Ok(deleted)
    }

    async fn get_nodes_by_labels(&self, labels: &[String]) -> Result<Vec<GraphNode>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .iter()
            .filter(|(_, record)| Self::has_all_labels(record, labels))
            .map(|(uri, record)| Self::to_node(uri, record))
            .collect())
    }

    async fn get_all_nodes_and_arcs(&self) -> Result<Vec<GraphNode>, StoreError> {
        let tables = self.tables.read().await;
        let mut result = Vec::with_capacity(tables.nodes.len());
        for (uri, record) in &tables.nodes {
            let mut node = Self::to_node(uri, record);
            node.arcs = tables
                .arcs
                .iter()
                .filter(|a| &a.from_uri == uri)
                .map(Self::to_arc)
                .collect();
            result.push(node);
        }
        Ok(result)
    }

    async fn create_arc(
        &self,
        from_uri: &str,
        to_uri: &str,
        arc_type: &str,
        properties: HashMap<String, GraphValue>,
    ) -> Result<Option<GraphArc>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.nodes.contains_key(from_uri) || !tables.nodes.contains_key(to_uri) {
            return Ok(None);
        }
        tables.next_id += 1;
        let record = ArcRecord {
            id: tables.next_id,
            arc_type: arc_type.to_string(),
            from_uri: from_uri.to_string(),
            to_uri: to_uri.to_string(),
            properties,
        };
        let arc = Self::to_arc(&record);
        tables.arcs.push(record);
        debug!(from = %from_uri, to = %to_uri, arc_type = %arc_type, "created arc");
        Ok(Some(arc))
    }

    async fn delete_arc_by_id(&self, arc_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.arcs.len();
        tables.arcs.retain(|a| a.id != arc_id);
        Ok(tables.arcs.len() < before)
    }

    async fn get_neighbors(
        &self,
        uri: &str,
        arc_type: &str,
        direction: ArcDirection,
        neighbor_label: Option<&str>,
    ) -> Result<Vec<GraphNode>, StoreError> {
        let tables = self.tables.read().await;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut neighbors = Vec::new();
        for arc in tables.arcs.iter().filter(|a| a.arc_type == arc_type) {
            let neighbor_uri = match direction {
                ArcDirection::Outgoing if arc.from_uri == uri => arc.to_uri.as_str(),
                ArcDirection::Incoming if arc.to_uri == uri => arc.from_uri.as_str(),
                _ => continue,
            };
            if !seen.insert(neighbor_uri) {
                continue;
            }
            if let Some(record) = tables.nodes.get(neighbor_uri) {
                if neighbor_label.map_or(true, |label| Self::has_label(record, label)) {
                    neighbors.push(Self::to_node(neighbor_uri, record));
                }
            }
        }
        Ok(neighbors)
    }

    async fn get_nodes_by_property(
        &self,
        label: &str,
        key: &str,
        value: &GraphValue,
    ) -> Result<Vec<GraphNode>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .iter()
            .filter(|(_, record)| Self::has_label(record, label))
            .filter(|(_, record)| record.properties.get(key) == Some(value))
            .map(|(uri, record)| Self::to_node(uri, record))
            .collect())
    }

    async fn get_nodes_by_property_in(
        &self,
        label: &str,
        key: &str,
        values: &[String],
    ) -> Result<Vec<GraphNode>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .iter()
            .filter(|(_, record)| Self::has_label(record, label))
            .filter(|(_, record)| {
                record
                    .properties
                    .get(key)
                    .and_then(|v| v.as_str())
                    .map_or(false, |v| values.iter().any(|candidate| candidate == v))
            })
            .map(|(uri, record)| Self::to_node(uri, record))
            .collect())
    }

    async fn get_root_nodes(
        &self,
        label: &str,
        arc_type: &str,
    ) -> Result<Vec<GraphNode>, StoreError> {
        let tables = self.tables.read().await;
        let mut roots = Vec::new();
        for (uri, record) in &tables.nodes {
            if !Self::has_label(record, label) {
                continue;
            }
            let has_outgoing = tables.arcs.iter().any(|a| {
                a.arc_type == arc_type
                    && &a.from_uri == uri
                    && tables
                        .nodes
                        .get(&a.to_uri)
                        .map_or(false, |target| Self::has_label(target, label))
            });
            if !has_outgoing {
                roots.push(Self::to_node(uri, record));
            }
        }
        Ok(roots)
    }

    /// Raw statements are an escape hatch for engine-backed stores; this
    /// backend has no statement interpreter.
    async fn run_raw(&self, statement: Statement) -> Result<Vec<GraphRow>, StoreError> {
        Err(StoreError::QueryError(format!(
            "the in-memory store does not execute raw statements (got: {})",
            statement.text
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, GraphValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), GraphValue::from(*v)))
            .collect()
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = MemoryGraphStore::new();
        let node = store
            .create_node(props(&[("title", "X")]), &labels(&["Class"]))
            .await
            .unwrap();

        assert!(node.uri.starts_with("node_"));
        assert!(node.id.is_some());

        let fetched = store.get_node_by_uri(&node.uri).await.unwrap().unwrap();
        assert_eq!(fetched.get("title"), Some(&GraphValue::from("X")));
        assert!(fetched.has_label("Class"));
        assert_eq!(fetched.get(URI_KEY), Some(&GraphValue::from(node.uri.as_str())));
    }

    #[tokio::test]
    async fn test_create_node_rejects_duplicate_uri() {
        let store = MemoryGraphStore::new();
        store
            .create_node(props(&[("uri", "node_dup")]), &labels(&["Class"]))
            .await
            .unwrap();
        let result = store
            .create_node(props(&[("uri", "node_dup")]), &labels(&["Class"]))
            .await;
        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_update_node_merges_properties() {
        let store = MemoryGraphStore::new();
        let node = store
            .create_node(props(&[("title", "old"), ("description", "keep")]), &[])
            .await
            .unwrap();

        let updated = store
            .update_node(&node.uri, props(&[("title", "new")]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("title"), Some(&GraphValue::from("new")));
        assert_eq!(updated.get("description"), Some(&GraphValue::from("keep")));

        assert!(store
            .update_node("node_absent", props(&[("title", "x")]))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_node_detaches_arcs() {
        let store = MemoryGraphStore::new();
        let a = store.create_node(HashMap::new(), &[]).await.unwrap();
        let b = store.create_node(HashMap::new(), &[]).await.unwrap();
        store
            .create_arc(&a.uri, &b.uri, "LINKS", HashMap::new())
            .await
            .unwrap()
            .unwrap();

        assert!(store.delete_node_by_uri(&b.uri).await.unwrap());
        assert!(!store.delete_node_by_uri(&b.uri).await.unwrap());

        let remaining = store.get_all_nodes_and_arcs().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].arcs.is_empty());
    }

    #[tokio::test]
    async fn test_label_scan_and_full_scan() {
        let store = MemoryGraphStore::new();
        store
            .create_node(HashMap::new(), &labels(&["Class"]))
            .await
            .unwrap();
        store
            .create_node(HashMap::new(), &labels(&["Class", "Deprecated"]))
            .await
            .unwrap();
        store
            .create_node(HashMap::new(), &labels(&["Object"]))
            .await
            .unwrap();

        assert_eq!(
            store.get_nodes_by_labels(&labels(&["Class"])).await.unwrap().len(),
            2
        );
        assert_eq!(
            store
                .get_nodes_by_labels(&labels(&["Class", "Deprecated"]))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.get_nodes_by_labels(&[]).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_arc_requires_both_endpoints() {
        let store = MemoryGraphStore::new();
        let a = store.create_node(HashMap::new(), &[]).await.unwrap();

        let missing = store
            .create_arc(&a.uri, "node_absent", "LINKS", HashMap::new())
            .await
            .unwrap();
        assert!(missing.is_none());

        let b = store.create_node(HashMap::new(), &[]).await.unwrap();
        let first = store
            .create_arc(&a.uri, &b.uri, "LINKS", HashMap::new())
            .await
            .unwrap()
            .unwrap();
        let second = store
            .create_arc(&a.uri, &b.uri, "LINKS", HashMap::new())
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first.id, second.id, "duplicate arcs accumulate");

        let all = store.get_all_nodes_and_arcs().await.unwrap();
        let from_a = all.iter().find(|n| n.uri == a.uri).unwrap();
        assert_eq!(from_a.arcs.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_arc_by_id() {
        let store = MemoryGraphStore::new();
        let a = store.create_node(HashMap::new(), &[]).await.unwrap();
        let b = store.create_node(HashMap::new(), &[]).await.unwrap();
        let arc = store
            .create_arc(&a.uri, &b.uri, "LINKS", HashMap::new())
            .await
            .unwrap()
            .unwrap();

        let arc_id = arc.id.unwrap();
        assert!(store.delete_arc_by_id(arc_id).await.unwrap());
        assert!(!store.delete_arc_by_id(arc_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_neighbors_direction_and_label_filter() {
        let store = MemoryGraphStore::new();
        let child = store
            .create_node(props(&[("uri", "node_child")]), &labels(&["Class"]))
            .await
            .unwrap();
        let parent = store
            .create_node(props(&[("uri", "node_parent")]), &labels(&["Class"]))
            .await
            .unwrap();
        let stray = store
            .create_node(props(&[("uri", "node_doc")]), &labels(&["Document"]))
            .await
            .unwrap();
        store
            .create_arc(&child.uri, &parent.uri, "SUBCLASS_OF", HashMap::new())
            .await
            .unwrap();
        store
            .create_arc(&child.uri, &stray.uri, "SUBCLASS_OF", HashMap::new())
            .await
            .unwrap();
        // A second identical arc must not duplicate the neighbor.
        store
            .create_arc(&child.uri, &parent.uri, "SUBCLASS_OF", HashMap::new())
            .await
            .unwrap();

        let parents = store
            .get_neighbors(&child.uri, "SUBCLASS_OF", ArcDirection::Outgoing, Some("Class"))
            .await
            .unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].uri, "node_parent");

        let children = store
            .get_neighbors(&parent.uri, "SUBCLASS_OF", ArcDirection::Incoming, Some("Class"))
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].uri, "node_child");

        let unfiltered = store
            .get_neighbors(&child.uri, "SUBCLASS_OF", ArcDirection::Outgoing, None)
            .await
            .unwrap();
        assert_eq!(unfiltered.len(), 2);
    }

    #[tokio::test]
    async fn test_property_lookups() {
        let store = MemoryGraphStore::new();
        store
            .create_node(
                props(&[("uri", "node_o1"), ("class_uri", "node_c1")]),
                &labels(&["Object"]),
            )
            .await
            .unwrap();
        store
            .create_node(
                props(&[("uri", "node_o2"), ("class_uri", "node_c2")]),
                &labels(&["Object"]),
            )
            .await
            .unwrap();

        let hits = store
            .get_nodes_by_property("Object", "class_uri", &GraphValue::from("node_c1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uri, "node_o1");

        let hits = store
            .get_nodes_by_property_in(
                "Object",
                "class_uri",
                &["node_c1".to_string(), "node_c2".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store
            .get_nodes_by_property_in("Object", "class_uri", &[])
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_root_nodes() {
        let store = MemoryGraphStore::new();
        let root = store
            .create_node(props(&[("uri", "node_root")]), &labels(&["Class"]))
            .await
            .unwrap();
        let child = store
            .create_node(props(&[("uri", "node_kid")]), &labels(&["Class"]))
            .await
            .unwrap();
        store
            .create_arc(&child.uri, &root.uri, "SUBCLASS_OF", HashMap::new())
            .await
            .unwrap();

        let roots = store.get_root_nodes("Class", "SUBCLASS_OF").await.unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].uri, "node_root");
    }

    #[tokio::test]
    async fn test_batch_delete_counts_and_skips_absent() {
        let store = MemoryGraphStore::new();
        let a = store.create_node(HashMap::new(), &[]).await.unwrap();
        let b = store.create_node(HashMap::new(), &[]).await.unwrap();

        let deleted = store
            .delete_nodes_by_uris(&[a.uri.clone(), "node_absent".to_string(), b.uri.clone()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert!(store.get_nodes_by_labels(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_raw_is_unsupported() {
        let store = MemoryGraphStore::new();
        let result = store.run_raw(Statement::new("RETURN 1")).await;
        assert!(matches!(result, Err(StoreError::QueryError(_))));
    }
}
