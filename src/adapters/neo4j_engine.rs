//! Neo4j implementation of the [`GraphEngine`] trait over a pooled Bolt
//! connection.
//!
//! Result rows are decoded by probing the statement's RETURN aliases with
//! the driver's typed getters, so only plain columns (scalars, string
//! lists, property maps) ever cross the trait boundary. Statements built
//! upstream already follow that column discipline.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::data::entities::EntityKind;
use crate::data::errors::StoreError;
use crate::data::records::{symbol, URI_KEY};
use crate::data::types::{GraphRow, GraphValue};
use crate::traits::graph_engine::{GraphEngine, Statement};

/// Configuration for the Neo4j connection.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub pool_size: usize,
    pub connection_retry_count: u32,
    pub connection_retry_delay: Duration,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: None,
            pool_size: 10,
            connection_retry_count: 3,
            connection_retry_delay: Duration::from_secs(2),
        }
    }
}

impl Neo4jConfig {
    /// Reads `NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`,
    /// `NEO4J_DATABASE`, and `NEO4J_POOL_SIZE`, falling back to the
    /// defaults for anything unset. Callers load `.env` themselves.
    pub fn from_env() -> Self {
        let defaults = Neo4jConfig::default();
        Neo4jConfig {
            uri: env::var("NEO4J_URI").unwrap_or_else(|_| defaults.uri.clone()),
            username: env::var("NEO4J_USERNAME").unwrap_or_else(|_| defaults.username.clone()),
            password: env::var("NEO4J_PASSWORD").unwrap_or_else(|_| defaults.password.clone()),
            database: env::var("NEO4J_DATABASE").ok(),
            pool_size: env::var("NEO4J_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.pool_size),
            connection_retry_count: defaults.connection_retry_count,
            connection_retry_delay: defaults.connection_retry_delay,
        }
    }
}

/// Pooled Neo4j-backed [`GraphEngine`].
pub struct Neo4jGraphEngine {
    pub graph: Arc<Graph>,
    config: Neo4jConfig,
}

impl Neo4jGraphEngine {
    pub fn config(&self) -> &Neo4jConfig {
        &self.config
    }

    /// Connects with retries, verifying liveness with a trivial statement
    /// before handing the pool out.
    pub async fn connect(config: Neo4jConfig) -> Result<Self, StoreError> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.username)
            .password(&config.password)
            .max_connections(config.pool_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let driver_config = builder.build().map_err(|e| {
            StoreError::EngineUnavailable(format!("failed to build driver config: {}", e))
        })?;

        let mut last_error = None;
        for attempt in 1..=config.connection_retry_count {
            match Graph::connect(driver_config.clone()).await {
                Ok(graph) => {
                    let probe = Query::new("RETURN 1 as test".to_string());
                    match graph.execute(probe).await {
                        Ok(_) => {
                            info!(uri = %config.uri, attempt, "connected to Neo4j");
                            return Ok(Self {
                                graph: Arc::new(graph),
                                config,
                            });
                        }
                        Err(e) => {
                            error!(attempt, error = %e, "connection liveness probe failed");
                            last_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    error!(attempt, error = %e, "failed to connect to Neo4j");
                    last_error = Some(e);
                }
            }
            if attempt < config.connection_retry_count {
                tokio::time::sleep(config.connection_retry_delay).await;
            }
        }

        Err(StoreError::EngineUnavailable(format!(
            "failed to connect to Neo4j at {} after {} attempts, last error: {:?}",
            config.uri, config.connection_retry_count, last_error
        )))
    }

    /// Installs a per-label uri uniqueness constraint for each ontology
    /// label. Safe to call repeatedly.
    pub async fn ensure_uri_constraints(&self) -> Result<(), StoreError> {
        for kind in [
            EntityKind::Class,
            EntityKind::DatatypeProperty,
            EntityKind::ObjectProperty,
            EntityKind::Object,
        ] {
            let statement = format!(
                "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
                symbol(&format!("uri_{}", kind.label())),
                symbol(kind.label()),
                symbol(URI_KEY)
            );
            self.graph
                .run(Query::new(statement))
                .await
                .map_err(|e| map_engine_error("constraint bootstrap", e))?;
            debug!(label = kind.label(), "uri uniqueness constraint ensured");
        }
        Ok(())
    }

    fn apply_params(mut query: Query, params: &HashMap<String, GraphValue>) -> Query {
        for (key, value) in params {
            query = match value {
                GraphValue::Null => query,
                GraphValue::Bool(b) => query.param(key, *b),
                GraphValue::Integer(i) => query.param(key, *i),
                GraphValue::Float(f) => query.param(key, *f),
                GraphValue::String(s) => query.param(key, s.as_str()),
                GraphValue::List(items) => {
                    let strings: Vec<String> = items
                        .iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect();
                    query.param(key, strings)
                }
                GraphValue::Map(_) | GraphValue::Json(_) => {
                    // The driver has no direct map parameter support here;
                    // map-shaped values travel inline in the statement text.
                    warn!(key = %key, "skipping map-shaped parameter");
                    query
                }
            };
        }
        query
    }

    fn value_from_row(row: &neo4rs::Row, alias: &str) -> Option<GraphValue> {
        // Json matches almost anything, so probe it last.
        if let Ok(v) = row.get::<i64>(alias) {
            return Some(GraphValue::Integer(v));
        }
        if let Ok(v) = row.get::<f64>(alias) {
            return Some(GraphValue::Float(v));
        }
        if let Ok(v) = row.get::<bool>(alias) {
            return Some(GraphValue::Bool(v));
        }
        if let Ok(v) = row.get::<String>(alias) {
            return Some(GraphValue::String(v));
        }
        if let Ok(v) = row.get::<Vec<String>>(alias) {
            return Some(GraphValue::from(v));
        }
        if let Ok(v) = row.get::<serde_json::Value>(alias) {
            return Some(GraphValue::Json(v));
        }
        None
    }

    fn row_to_map(row: &neo4rs::Row, aliases: &[String]) -> GraphRow {
        let mut map = GraphRow::new();
        for alias in aliases {
            match Self::value_from_row(row, alias) {
                Some(value) => {
                    map.insert(alias.clone(), value);
                }
                None => debug!(alias = %alias, "column absent or of unsupported type"),
            }
        }
        map
    }
}

/// Extracts the column aliases of a statement's final RETURN clause:
/// `id(n) AS id` yields `id`, a bare `cnt` yields `cnt`. Commas inside
/// parentheses, brackets, or braces do not split items; a trailing
/// `LIMIT`/`SKIP`/`ORDER BY` tail is ignored.
fn statement_aliases(text: &str) -> Vec<String> {
    let upper = text.to_ascii_uppercase();
    let clause_start = match upper.rfind(" RETURN ") {
        Some(i) => i + " RETURN ".len(),
        None if upper.starts_with("RETURN ") => "RETURN ".len(),
        None => return Vec::new(),
    };
    let clause = &text[clause_start..];

    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in clause.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                items.push(current.clone());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        items.push(current);
    }

    items.iter().map(|item| alias_of(item)).collect()
}

fn alias_of(item: &str) -> String {
    let item = item.trim();
    let upper = item.to_ascii_uppercase();
    let mut end = item.len();
    for marker in [" LIMIT ", " SKIP ", " ORDER BY "] {
        if let Some(i) = upper.find(marker) {
            end = end.min(i);
        }
    }
    let item = item[..end].trim();
    let upper = &upper[..end];
    match upper.rfind(" AS ") {
        Some(i) => item[i + " AS ".len()..].trim().to_string(),
        None => item.to_string(),
    }
}

/// Classifies a driver error by its message: the 0.7 driver surfaces
/// server failures as formatted text, so constraint and connection
/// problems are recognized by content.
fn map_engine_error(context: &str, e: neo4rs::Error) -> StoreError {
    let text = e.to_string();
    let lowered = text.to_ascii_lowercase();
    if lowered.contains("constraintvalidation") || lowered.contains("already exists") {
        StoreError::ConstraintViolation(text)
    } else if lowered.contains("connection") || lowered.contains("io error") {
        StoreError::EngineUnavailable(format!("{}: {}", context, text))
    } else {
        StoreError::QueryError(format!("{}: {}", context, text))
    }
}

#[async_trait]
impl GraphEngine for Neo4jGraphEngine {
    #[instrument(skip(self, statement))]
    async fn run(&self, statement: Statement) -> Result<Vec<GraphRow>, StoreError> {
        debug!(statement = %statement.text, "executing statement");
        let aliases = statement_aliases(&statement.text);
        let query = Self::apply_params(Query::new(statement.text), &statement.params);

        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| map_engine_error("execute", e))?;

        let mut rows = Vec::new();
        loop {
            match result.next().await {
                Ok(Some(row)) => rows.push(Self::row_to_map(&row, &aliases)),
                Ok(None) => break,
                Err(e) => return Err(map_engine_error("stream", e)),
            }
        }
        Ok(rows)
    }

    #[instrument(skip(self, statements), fields(batch = statements.len()))]
    async fn run_atomic(&self, statements: Vec<Statement>) -> Result<(), StoreError> {
        let mut txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| StoreError::TransactionError(format!("begin failed: {}", e)))?;

        let queries: Vec<Query> = statements
            .into_iter()
            .map(|statement| {
                let Statement { text, params } = statement;
                Self::apply_params(Query::new(text), &params)
            })
            .collect();

        if let Err(e) = txn.run_queries(queries).await {
            let failure = map_engine_error("batch", e);
            if let Err(rollback_error) = txn.rollback().await {
                warn!(error = %rollback_error, "rollback after failed batch also failed");
            }
            return Err(failure);
        }
        txn.commit()
            .await
            .map_err(|e| StoreError::TransactionError(format!("commit failed: {}", e)))
    }
}
