//! Seam to the external graph engine.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::data::errors::StoreError;
use crate::data::types::{GraphRow, GraphValue};

/// One parameterized statement for the graph engine. Untrusted values are
/// always carried in `params`, never spliced into `text`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: HashMap<String, GraphValue>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Statement {
            text: text.into(),
            params: HashMap::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<GraphValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// The single capability the storage layer requires from a graph engine:
/// execute one parameterized statement, get back rows of generic values.
///
/// Implementations must normalize node and relationship values into plain
/// mappings before they cross this boundary; engine-native handles never
/// leak upward.
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Executes one statement, returning every result row.
    async fn run(&self, statement: Statement) -> Result<Vec<GraphRow>, StoreError>;

    /// Executes a statement batch inside a single transaction, in order.
    /// On any failure the whole batch is rolled back and nothing is applied.
    async fn run_atomic(&self, statements: Vec<Statement>) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_builder() {
        let statement = Statement::new("MATCH (n {`uri`: $uri}) RETURN n")
            .param("uri", "node_1")
            .param("limit", 5i64);

        assert_eq!(statement.text, "MATCH (n {`uri`: $uri}) RETURN n");
        assert_eq!(
            statement.params.get("uri"),
            Some(&GraphValue::String("node_1".to_string()))
        );
        assert_eq!(statement.params.get("limit"), Some(&GraphValue::Integer(5)));
    }
}
