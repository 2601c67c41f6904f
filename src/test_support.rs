//! In-memory doubles for the collaborator traits, used by unit tests

use crate::db::{Catalog, ColumnDescriptor, ResultTable, SqlBackend};
use crate::error::{AgentError, Result};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Language model returning a fixed reply (or a fixed error)
pub struct ScriptedModel {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(AgentError::Llm)
    }
}

/// Catalog and backend held in memory. The plan check accepts statements
/// starting with SELECT or WITH, which is enough to emulate syntax errors.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Vec<(String, Vec<ColumnDescriptor>)>,
    results: HashMap<String, ResultTable>,
    catalog_error: Option<String>,
    plan_error: Option<String>,
    execution_error: Option<String>,
    explained: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        let columns = columns
            .iter()
            .map(|(n, t)| ColumnDescriptor::new(*n, *t))
            .collect();
        self.tables.push((name.to_string(), columns));
        self
    }

    pub fn with_result(mut self, sql: &str, columns: &[&str], rows: Vec<Vec<serde_json::Value>>) -> Self {
        self.results.insert(
            sql.to_string(),
            ResultTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
        );
        self
    }

    pub fn failing_catalog(mut self, message: &str) -> Self {
        self.catalog_error = Some(message.to_string());
        self
    }

    pub fn rejecting_plan(mut self, message: &str) -> Self {
        self.plan_error = Some(message.to_string());
        self
    }

    pub fn failing_execution(mut self, message: &str) -> Self {
        self.execution_error = Some(message.to_string());
        self
    }

    pub fn explained(&self) -> Vec<String> {
        self.explained.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for MemoryDatabase {
    async fn list_tables(&self, _namespace: &str) -> Result<Vec<String>> {
        if let Some(ref msg) = self.catalog_error {
            return Err(AgentError::Database(msg.clone()));
        }
        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn list_columns(&self, _namespace: &str, table: &str) -> Result<Vec<ColumnDescriptor>> {
        Ok(self
            .tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SqlBackend for MemoryDatabase {
    async fn explain(&self, sql: &str) -> Result<()> {
        self.explained.lock().unwrap().push(sql.to_string());
        if let Some(ref msg) = self.plan_error {
            return Err(AgentError::Database(msg.clone()));
        }
        let first = sql.split_whitespace().next().unwrap_or("");
        if first.eq_ignore_ascii_case("SELECT") || first.eq_ignore_ascii_case("WITH") {
            Ok(())
        } else if first.is_empty() {
            Err(AgentError::Database("syntax error at end of input".to_string()))
        } else {
            Err(AgentError::Database(format!("syntax error at or near \"{}\"", first)))
        }
    }

    async fn execute(&self, sql: &str) -> Result<Option<ResultTable>> {
        self.executed.lock().unwrap().push(sql.to_string());
        if let Some(ref msg) = self.execution_error {
            return Err(AgentError::Database(msg.clone()));
        }
        Ok(self.results.get(sql).cloned())
    }
}
