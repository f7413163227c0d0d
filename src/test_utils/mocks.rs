//! mockall double for the engine seam.
//!
//! [`ScriptedEngine`](super::fake_engine::ScriptedEngine) covers most test
//! needs; reach for [`MockEngine`] when a test wants call-count or
//! argument expectations instead of a replay queue.

use async_trait::async_trait;
use mockall::mock;

use crate::data::errors::StoreError;
use crate::data::types::GraphRow;
use crate::traits::graph_engine::{GraphEngine, Statement};

mock! {
    pub Engine {}

    #[async_trait]
    impl GraphEngine for Engine {
        async fn run(&self, statement: Statement) -> Result<Vec<GraphRow>, StoreError>;
        async fn run_atomic(&self, statements: Vec<Statement>) -> Result<(), StoreError>;
    }
}
