//! Guarded execution of validated SQL

use crate::db::{ResultTable, SqlBackend};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const EMPTY_RESULT_MESSAGE: &str = "Nenhum dado encontrado";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Rows(ResultTable),
    /// The query ran and returned nothing
    Empty,
    Failure(String),
}

impl ExecutionOutcome {
    /// Human-readable text for outcomes that are not a table
    pub fn message(&self) -> Option<String> {
        match self {
            ExecutionOutcome::Rows(_) => None,
            ExecutionOutcome::Empty => Some(EMPTY_RESULT_MESSAGE.to_string()),
            ExecutionOutcome::Failure(msg) => Some(msg.clone()),
        }
    }
}

pub struct QueryExecutor {
    backend: Arc<dyn SqlBackend>,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn SqlBackend>) -> Self {
        Self { backend }
    }

    /// Run the statement and materialize the whole result. Errors never
    /// escape; they come back as `Failure`.
    pub async fn run(&self, sql: &str) -> ExecutionOutcome {
        let start = Instant::now();

        match self.backend.execute(sql).await {
            Ok(Some(table)) if !table.is_empty() => {
                info!(
                    "Query returned {} rows x {} columns in {} ms",
                    table.row_count(),
                    table.columns.len(),
                    start.elapsed().as_millis()
                );
                ExecutionOutcome::Rows(table)
            }
            Ok(_) => {
                info!("Query returned no rows");
                ExecutionOutcome::Empty
            }
            Err(e) => {
                warn!("Execution failed: {}", e);
                ExecutionOutcome::Failure(format!("Erro no PostgreSQL: {}", e))
            }
        }
    }
}
