//! Statement-building storage backend for engines that speak the Cypher
//! pattern language.
//!
//! Every structured operation is rendered into a statement whose RETURN
//! clause lists plain columns (`id(n) AS id`, `labels(n) AS labels`,
//! `properties(n) AS props`), so the engine adapter never has to hand back
//! node or relationship handles. Labels, relationship types, and property
//! keys are back-quoted through [`symbol`]; property values travel as
//! parameters except in CREATE, where the inline map literal keeps the
//! statement self-contained.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::data::errors::StoreError;
use crate::data::identifiers::generate_uri;
use crate::data::records::{label_fragment, map_fragment, symbol, GraphArc, GraphNode, URI_KEY};
use crate::data::types::{GraphRow, GraphValue, GraphValueMapExt};
use crate::traits::graph_engine::{GraphEngine, Statement};
use crate::traits::graph_store::{ArcDirection, GraphStore};

const NODE_COLUMNS: &str = "id(n) AS id, labels(n) AS labels, properties(n) AS props";
const ARC_COLUMNS: &str = "id(r) AS arc_id, type(r) AS arc_type, \
     a.`uri` AS from_uri, b.`uri` AS to_uri, properties(r) AS arc_props";

/// [`GraphStore`] implementation that compiles each call into Cypher and
/// delegates execution to a [`GraphEngine`].
pub struct CypherGraphStore {
    engine: Arc<dyn GraphEngine>,
}

impl CypherGraphStore {
    pub fn new(engine: Arc<dyn GraphEngine>) -> Self {
        Self { engine }
    }

    fn node_from_row(row: &GraphRow) -> Result<GraphNode, StoreError> {
        let props = row
            .get("props")
            .ok_or_else(|| StoreError::MappingError("node row missing `props` column".to_string()))?;
        GraphNode::from_row_parts(row.get_i64("id"), row.get_strings("labels"), props)
    }

    fn nodes_from_rows(rows: &[GraphRow]) -> Result<Vec<GraphNode>, StoreError> {
        rows.iter().map(Self::node_from_row).collect()
    }

    fn arc_from_row(row: &GraphRow) -> Result<GraphArc, StoreError> {
        let missing =
            |col: &str| StoreError::MappingError(format!("arc row missing `{}` column", col));
        let properties = match row.get("arc_props") {
            Some(value) => crate::data::records::prop_map_from_value(value)?,
            None => HashMap::new(),
        };
        Ok(GraphArc {
            id: row.get_i64("arc_id"),
            arc_type: row.get_string("arc_type").ok_or_else(|| missing("arc_type"))?,
            from_uri: row.get_string("from_uri").ok_or_else(|| missing("from_uri"))?,
            to_uri: row.get_string("to_uri").ok_or_else(|| missing("to_uri"))?,
            properties,
        })
    }

    fn count_from_rows(rows: &[GraphRow]) -> i64 {
        rows.first().and_then(|row| row.get_i64("cnt")).unwrap_or(0)
    }
}

#[async_trait]
impl GraphStore for CypherGraphStore {
    #[instrument(skip(self, properties), fields(labels = ?labels))]
    async fn create_node(
        &self,
        properties: HashMap<String, GraphValue>,
        labels: &[String],
    ) -> Result<GraphNode, StoreError> {
        let mut properties = properties;
        if properties.get(URI_KEY).and_then(|v| v.as_str()).is_none() {
            properties.insert(URI_KEY.to_string(), GraphValue::from(generate_uri()));
        }
        let text = format!(
            "CREATE (n{} {}) RETURN {}",
            label_fragment(labels),
            map_fragment(&properties)?,
            NODE_COLUMNS
        );
        let rows = self.engine.run(Statement::new(text)).await?;
        let row = rows
            .first()
            .ok_or_else(|| StoreError::QueryError("node create returned no row".to_string()))?;
        Self::node_from_row(row)
    }

    async fn get_node_by_uri(&self, uri: &str) -> Result<Option<GraphNode>, StoreError> {
        let text = format!(
            "MATCH (n {{{}: $uri}}) RETURN {} LIMIT 1",
            symbol(URI_KEY),
            NODE_COLUMNS
        );
        let rows = self.engine.run(Statement::new(text).param("uri", uri)).await?;
        rows.first().map(Self::node_from_row).transpose()
    }

    #[instrument(skip(self, properties))]
    async fn update_node(
        &self,
        uri: &str,
        properties: HashMap<String, GraphValue>,
    ) -> Result<Option<GraphNode>, StoreError> {
        if properties.is_empty() {
            return self.get_node_by_uri(uri).await;
        }
        // Positional parameter names keep arbitrary property keys out of
        // the parameter namespace.
        let mut keys: Vec<String> = properties.keys().cloned().collect();
        keys.sort();
        let mut assignments = Vec::with_capacity(keys.len());
        let mut params = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let name = format!("p_{}", i);
            assignments.push(format!("n.{} = ${}", symbol(key), name));
            params.push((name, properties[key].clone()));
        }
        let text = format!(
            "MATCH (n {{{}: $uri}}) SET {} RETURN {}",
            symbol(URI_KEY),
            assignments.join(", "),
            NODE_COLUMNS
        );
        let mut statement = Statement::new(text).param("uri", uri);
        for (name, value) in params {
            statement = statement.param(&name, value);
        }
        let rows = self.engine.run(statement).await?;
        rows.first().map(Self::node_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_node_by_uri(&self, uri: &str) -> Result<bool, StoreError> {
        let text = format!(
            "MATCH (n {{{}: $uri}}) DETACH DELETE n RETURN count(n) AS cnt",
            symbol(URI_KEY)
        );
        let rows = self.engine.run(Statement::new(text).param("uri", uri)).await?;
        Ok(Self::count_from_rows(&rows) > 0)
    }

    #[instrument(skip(self))]
    async fn delete_node_with_label(&self, uri: &str, label: &str) -> Result<bool, StoreError> {
        let text = format!(
            "MATCH (n:{} {{{}: $uri}}) DETACH DELETE n RETURN count(n) AS cnt",
            symbol(label),
            symbol(URI_KEY)
        );
        let rows = self.engine.run(Statement::new(text).param("uri", uri)).await?;
        Ok(Self::count_from_rows(&rows) > 0)
    }

    /// The batch runs as one transaction. The returned count is measured
    /// right before the batch, so a concurrent writer can skew it; callers
    /// treat it as diagnostic.
    #[instrument(skip(self, uris), fields(requested = uris.len()))]
    async fn delete_nodes_by_uris(&self, uris: &[String]) -> Result<usize, StoreError> {
        if uris.is_empty() {
            return Ok(0);
        }
        let count_text = format!(
            "MATCH (n) WHERE n.{} IN $uris RETURN count(n) AS cnt",
            symbol(URI_KEY)
        );
        let rows = self
            .engine
            .run(Statement::new(count_text).param("uris", uris.to_vec()))
            .await?;
        let matched = Self::count_from_rows(&rows) as usize;

        let delete_text = format!(
            "MATCH (n {{{}: $uri}}) DETACH DELETE n",
            symbol(URI_KEY)
        );
        let statements = uris
            .iter()
            .map(|uri| Statement::new(delete_text.clone()).param("uri", uri.as_str()))
            .collect();
        self.engine.run_atomic(statements).await?;
        debug!(requested = uris.len(), matched, "batch delete committed");
        Ok(matched)
    }

    async fn get_nodes_by_labels(&self, labels: &[String]) -> Result<Vec<GraphNode>, StoreError> {
        let text = format!("MATCH (n{}) RETURN {}", label_fragment(labels), NODE_COLUMNS);
        let rows = self.engine.run(Statement::new(text)).await?;
        Self::nodes_from_rows(&rows)
    }

    async fn get_all_nodes_and_arcs(&self) -> Result<Vec<GraphNode>, StoreError> {
        let node_rows = self
            .engine
            .run(Statement::new(format!("MATCH (n) RETURN {}", NODE_COLUMNS)))
            .await?;
        let mut order = Vec::with_capacity(node_rows.len());
        let mut by_uri: HashMap<String, GraphNode> = HashMap::new();
        for row in &node_rows {
            let node = Self::node_from_row(row)?;
            if !by_uri.contains_key(&node.uri) {
                order.push(node.uri.clone());
                by_uri.insert(node.uri.clone(), node);
            }
        }

        let arc_rows = self
            .engine
            .run(Statement::new(format!("MATCH (a)-[r]->(b) RETURN {}", ARC_COLUMNS)))
            .await?;
        for row in &arc_rows {
            let arc = Self::arc_from_row(row)?;
            match by_uri.get_mut(&arc.from_uri) {
                Some(node) => node.arcs.push(arc),
                None => {
                    warn!(from_uri = %arc.from_uri, "arc source missing from node scan, skipping")
                }
            }
        }
        Ok(order.into_iter().filter_map(|uri| by_uri.remove(&uri)).collect())
    }

    #[instrument(skip(self, properties))]
    async fn create_arc(
        &self,
        from_uri: &str,
        to_uri: &str,
        arc_type: &str,
        properties: HashMap<String, GraphValue>,
    ) -> Result<Option<GraphArc>, StoreError> {
        let text = format!(
            "MATCH (a {{{key}: $from_uri}}), (b {{{key}: $to_uri}}) \
             CREATE (a)-[r:{arc} {map}]->(b) RETURN {cols}",
            key = symbol(URI_KEY),
            arc = symbol(arc_type),
            map = map_fragment(&properties)?,
            cols = ARC_COLUMNS
        );
        let rows = self
            .engine
            .run(
                Statement::new(text)
                    .param("from_uri", from_uri)
                    .param("to_uri", to_uri),
            )
            .await?;
        // No row means at least one endpoint did not match.
        rows.first().map(Self::arc_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_arc_by_id(&self, arc_id: i64) -> Result<bool, StoreError> {
        let text = "MATCH ()-[r]->() WHERE id(r) = $arc_id DELETE r RETURN count(r) AS cnt";
        let rows = self
            .engine
            .run(Statement::new(text).param("arc_id", arc_id))
            .await?;
        Ok(Self::count_from_rows(&rows) > 0)
    }

    async fn get_neighbors(
        &self,
        uri: &str,
        arc_type: &str,
        direction: ArcDirection,
        neighbor_label: Option<&str>,
    ) -> Result<Vec<GraphNode>, StoreError> {
        let label = neighbor_label.map(|l| format!(":{}", symbol(l))).unwrap_or_default();
        let pattern = match direction {
            ArcDirection::Outgoing => format!(
                "(n {{{}: $uri}})-[:{}]->(m{})",
                symbol(URI_KEY),
                symbol(arc_type),
                label
            ),
            ArcDirection::Incoming => format!(
                "(n {{{}: $uri}})<-[:{}]-(m{})",
                symbol(URI_KEY),
                symbol(arc_type),
                label
            ),
        };
        let text = format!(
            "MATCH {} WITH DISTINCT m RETURN id(m) AS id, labels(m) AS labels, properties(m) AS props",
            pattern
        );
        let rows = self.engine.run(Statement::new(text).param("uri", uri)).await?;
        Self::nodes_from_rows(&rows)
    }

    async fn get_nodes_by_property(
        &self,
        label: &str,
        key: &str,
        value: &GraphValue,
    ) -> Result<Vec<GraphNode>, StoreError> {
        let text = format!(
            "MATCH (n:{}) WHERE n.{} = $value RETURN {}",
            symbol(label),
            symbol(key),
            NODE_COLUMNS
        );
        let rows = self
            .engine
            .run(Statement::new(text).param("value", value.clone()))
            .await?;
        Self::nodes_from_rows(&rows)
    }

    async fn get_nodes_by_property_in(
        &self,
        label: &str,
        key: &str,
        values: &[String],
    ) -> Result<Vec<GraphNode>, StoreError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let text = format!(
            "MATCH (n:{}) WHERE n.{} IN $values RETURN {}",
            symbol(label),
            symbol(key),
            NODE_COLUMNS
        );
        let rows = self
            .engine
            .run(Statement::new(text).param("values", values.to_vec()))
            .await?;
        Self::nodes_from_rows(&rows)
    }

    async fn get_root_nodes(
        &self,
        label: &str,
        arc_type: &str,
    ) -> Result<Vec<GraphNode>, StoreError> {
        let text = format!(
            "MATCH (n:{label}) WHERE NOT (n)-[:{arc}]->(:{label}) RETURN {cols}",
            label = symbol(label),
            arc = symbol(arc_type),
            cols = NODE_COLUMNS
        );
        let rows = self.engine.run(Statement::new(text)).await?;
        Self::nodes_from_rows(&rows)
    }

    async fn run_raw(&self, statement: Statement) -> Result<Vec<GraphRow>, StoreError> {
        self.engine.run(statement).await
    }
}
