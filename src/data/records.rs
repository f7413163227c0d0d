//! Canonical record shapes for graph nodes and arcs, plus safe fragment
//! construction for statement building.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::errors::StoreError;
use crate::data::types::GraphValue;

/// Property key holding a node's stable external identity.
pub const URI_KEY: &str = "uri";

/// A directed, typed edge between two nodes, addressed by endpoint uris.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphArc {
    /// Engine-local identifier; never stable across engine instances.
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub arc_type: String,
    pub from_uri: String,
    pub to_uri: String,
    #[serde(default)]
    pub properties: HashMap<String, GraphValue>,
}

/// A labeled node in the property graph.
///
/// `uri` is the stable external identity and is also present in
/// `properties`; `id` is engine-local and must not be used across process
/// or engine-instance boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Option<i64>,
    pub uri: String,
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: HashMap<String, GraphValue>,
    /// Outgoing arcs; populated only by whole-graph materialization.
    #[serde(default)]
    pub arcs: Vec<GraphArc>,
}

impl GraphNode {
    /// Normalizes the node columns of one result row into the canonical
    /// shape. `props` must be a map-shaped value carrying a string `uri`.
    pub fn from_row_parts(
        id: Option<i64>,
        labels: Vec<String>,
        props: &GraphValue,
    ) -> Result<GraphNode, StoreError> {
        let properties = prop_map_from_value(props)?;
        let uri = properties
            .get(URI_KEY)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                StoreError::MappingError(format!(
                    "node record (engine id {:?}) has no `{}` property",
                    id, URI_KEY
                ))
            })?;
        Ok(GraphNode {
            id,
            uri,
            labels,
            properties,
            arcs: Vec::new(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&GraphValue> {
        self.properties.get(key)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Converts a map-shaped row value (JSON object or value map) into a
/// property mapping.
pub fn prop_map_from_value(value: &GraphValue) -> Result<HashMap<String, GraphValue>, StoreError> {
    match value {
        GraphValue::Map(map) => Ok(map.clone()),
        GraphValue::Json(serde_json::Value::Object(obj)) => {
            let mut map = HashMap::new();
            for (key, value) in obj {
                map.insert(key.clone(), GraphValue::from_json(value.clone()));
            }
            Ok(map)
        }
        other => Err(StoreError::MappingError(format!(
            "expected a map-shaped value, got {:?}",
            other
        ))),
    }
}

/// Back-quotes a label, relationship type, or property key so reserved
/// characters cannot break the surrounding statement. Interior back-quotes
/// are doubled per the escaping rules of the pattern language.
pub fn symbol(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Renders a label fragment for a node pattern: `:`A`:`B``. An empty label
/// list renders as an empty string, leaving the pattern unrestricted.
pub fn label_fragment(labels: &[String]) -> String {
    labels
        .iter()
        .map(|label| format!(":{}", symbol(label)))
        .collect()
}

/// Renders an inline property map literal with back-quoted keys and values
/// passed through the strict JSON encoder. Keys are emitted in sorted order
/// so generated statements are stable.
pub fn map_fragment(properties: &HashMap<String, GraphValue>) -> Result<String, StoreError> {
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();

    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let value = &properties[key];
        let encoded = serde_json::to_string(&value.to_json())
            .map_err(|e| StoreError::MappingError(format!("unencodable property `{}`: {}", key, e)))?;
        entries.push(format!("{}: {}", symbol(key), encoded));
    }
    Ok(format!("{{{}}}", entries.join(", ")))
}
