//! Generic value types exchanged with the graph engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One result row returned by the graph engine: column name to value.
pub type GraphRow = HashMap<String, GraphValue>;

/// A single value carried in a statement parameter, a node or arc property,
/// or a result-row column.
///
/// Node- and relationship-shaped row values arrive as [`GraphValue::Json`]
/// mappings; engine-native handles never cross this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<GraphValue>),
    Map(HashMap<String, GraphValue>),
    Json(serde_json::Value),
}

impl GraphValue {
    /// Returns the contained string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::String(s) => Some(s),
            GraphValue::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GraphValue::Integer(i) => Some(*i),
            GraphValue::Float(f) => Some(*f as i64),
            GraphValue::Json(v) => v.as_i64(),
            GraphValue::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GraphValue::Float(f) => Some(*f),
            GraphValue::Integer(i) => Some(*i as f64),
            GraphValue::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GraphValue::Bool(b) => Some(*b),
            GraphValue::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    /// Converts to a JSON value; lossless for every variant.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            GraphValue::Null => serde_json::Value::Null,
            GraphValue::Bool(b) => serde_json::json!(b),
            GraphValue::Integer(i) => serde_json::json!(i),
            GraphValue::Float(f) => serde_json::json!(f),
            GraphValue::String(s) => serde_json::json!(s),
            GraphValue::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            GraphValue::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (key, value) in map {
                    obj.insert(key.clone(), value.to_json());
                }
                serde_json::Value::Object(obj)
            }
            GraphValue::Json(v) => v.clone(),
        }
    }

    /// Builds a value from JSON, picking the narrowest matching variant.
    pub fn from_json(value: serde_json::Value) -> GraphValue {
        match value {
            serde_json::Value::Null => GraphValue::Null,
            serde_json::Value::Bool(b) => GraphValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    GraphValue::Integer(i)
                } else {
                    GraphValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => GraphValue::String(s),
            serde_json::Value::Array(items) => {
                GraphValue::List(items.into_iter().map(GraphValue::from_json).collect())
            }
            serde_json::Value::Object(obj) => {
                let mut map = HashMap::new();
                for (key, value) in obj {
                    map.insert(key, GraphValue::from_json(value));
                }
                GraphValue::Map(map)
            }
        }
    }
}

impl fmt::Display for GraphValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphValue::Null => write!(f, "null"),
            GraphValue::Bool(b) => write!(f, "{}", b),
            GraphValue::Integer(i) => write!(f, "{}", i),
            GraphValue::Float(v) => write!(f, "{}", v),
            GraphValue::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for GraphValue {
    fn from(value: &str) -> Self {
        GraphValue::String(value.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(value: String) -> Self {
        GraphValue::String(value)
    }
}

impl From<i64> for GraphValue {
    fn from(value: i64) -> Self {
        GraphValue::Integer(value)
    }
}

impl From<f64> for GraphValue {
    fn from(value: f64) -> Self {
        GraphValue::Float(value)
    }
}

impl From<bool> for GraphValue {
    fn from(value: bool) -> Self {
        GraphValue::Bool(value)
    }
}

impl From<Vec<String>> for GraphValue {
    fn from(values: Vec<String>) -> Self {
        GraphValue::List(values.into_iter().map(GraphValue::String).collect())
    }
}

impl From<serde_json::Value> for GraphValue {
    fn from(value: serde_json::Value) -> Self {
        GraphValue::Json(value)
    }
}

/// Typed extraction helpers for row mappings.
pub trait GraphValueMapExt {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_strings(&self, key: &str) -> Vec<String>;
}

impl GraphValueMapExt for HashMap<String, GraphValue> {
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    fn get_strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(GraphValue::List(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            Some(GraphValue::Json(serde_json::Value::Array(items))) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }
}
