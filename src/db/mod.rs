//! Database access for catalog introspection and query execution
//!
//! The pipeline only talks to the traits below; `PgDatabase` is the
//! PostgreSQL implementation backed by a sqlx pool.

pub mod connection;
pub mod postgres;

pub use connection::{init_pool, DbPool};
pub use postgres::PgDatabase;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A column as declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Fully materialized result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read-only view of the table/column catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Table names in `namespace`, in catalog order
    async fn list_tables(&self, namespace: &str) -> Result<Vec<String>>;

    /// Columns of `table` in declaration order
    async fn list_columns(&self, namespace: &str, table: &str) -> Result<Vec<ColumnDescriptor>>;
}

/// Plan-check and execution of SQL text
#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Ask for an execution plan without running the statement
    async fn explain(&self, sql: &str) -> Result<()>;

    /// Run the statement; `None` when it produced no result set
    async fn execute(&self, sql: &str) -> Result<Option<ResultTable>>;
}
