//! Scripted engine fake for exercising statement builders without a live
//! graph backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::data::errors::StoreError;
use crate::data::types::{GraphRow, GraphValue};
use crate::traits::graph_engine::{GraphEngine, Statement};

/// One canned reply, consumed by the next `run` or `run_atomic` call.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Rows(Vec<GraphRow>),
    ConstraintViolation(String),
    Unavailable(String),
}

/// Records every statement it receives and replays queued responses in
/// order. An empty queue answers with no rows, so happy-path tests only
/// queue the replies they care about. `run_atomic` also consumes one
/// queued response, which lets tests script batch failures.
#[derive(Default)]
pub struct ScriptedEngine {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    statements: Mutex<Vec<Statement>>,
    atomic_batches: Mutex<Vec<Vec<Statement>>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<GraphRow>) {
        self.responses.lock().push_back(ScriptedResponse::Rows(rows));
    }

    pub fn push_constraint_violation(&self, message: &str) {
        self.responses
            .lock()
            .push_back(ScriptedResponse::ConstraintViolation(message.to_string()));
    }

    pub fn push_unavailable(&self, message: &str) {
        self.responses
            .lock()
            .push_back(ScriptedResponse::Unavailable(message.to_string()));
    }

    /// Everything `run` has received, in call order.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().clone()
    }

    /// Every batch `run_atomic` has received, in call order.
    pub fn atomic_batches(&self) -> Vec<Vec<Statement>> {
        self.atomic_batches.lock().clone()
    }

    /// Builds a result row from column name and value pairs.
    pub fn row(pairs: &[(&str, GraphValue)]) -> GraphRow {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn next_response(&self) -> ScriptedResponse {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(ScriptedResponse::Rows(Vec::new()))
    }

    fn reply(response: ScriptedResponse) -> Result<Vec<GraphRow>, StoreError> {
        match response {
            ScriptedResponse::Rows(rows) => Ok(rows),
            ScriptedResponse::ConstraintViolation(message) => {
                Err(StoreError::ConstraintViolation(message))
            }
            ScriptedResponse::Unavailable(message) => Err(StoreError::EngineUnavailable(message)),
        }
    }
}

#[async_trait]
impl GraphEngine for ScriptedEngine {
    async fn run(&self, statement: Statement) -> Result<Vec<GraphRow>, StoreError> {
        self.statements.lock().push(statement);
        Self::reply(self.next_response())
    }

    async fn run_atomic(&self, statements: Vec<Statement>) -> Result<(), StoreError> {
        self.atomic_batches.lock().push(statements);
        Self::reply(self.next_response()).map(|_| ())
    }
}
