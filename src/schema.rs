//! Schema snapshot rendering for the generation prompt
//!
//! The catalog is read fresh on every request; nothing is cached, since the
//! schema may change between questions.

use crate::db::{Catalog, ColumnDescriptor};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// Tables in the order the catalog returned them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableDescriptor>,
}

impl SchemaSnapshot {
    pub fn render(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            let _ = write!(out, "\nTable: {}\n", table.name);
            for column in &table.columns {
                let _ = writeln!(out, " - {} ({})", column.name, column.data_type);
            }
        }
        out
    }
}

pub struct SchemaProvider {
    catalog: Arc<dyn Catalog>,
    namespace: String,
}

impl SchemaProvider {
    pub fn new(catalog: Arc<dyn Catalog>, namespace: impl Into<String>) -> Self {
        Self {
            catalog,
            namespace: namespace.into(),
        }
    }

    pub async fn snapshot(&self) -> Result<SchemaSnapshot> {
        let mut tables = Vec::new();
        for name in self.catalog.list_tables(&self.namespace).await? {
            let columns = self.catalog.list_columns(&self.namespace, &name).await?;
            tables.push(TableDescriptor { name, columns });
        }
        Ok(SchemaSnapshot { tables })
    }

    /// Render the current schema. Never fails: a catalog error is returned
    /// as text so generation always receives something to embed.
    pub async fn fetch_schema(&self) -> String {
        match self.snapshot().await {
            Ok(snapshot) => {
                debug!(
                    "Fetched schema for '{}': {} tables",
                    self.namespace,
                    snapshot.tables.len()
                );
                snapshot.render()
            }
            Err(e) => {
                warn!("Schema introspection failed: {}", e);
                format!("Erro ao retornar schema: {}", e)
            }
        }
    }
}
