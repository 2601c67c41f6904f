//! Request pipeline: generate -> validate -> execute
//!
//! A `RequestState` moves forward through `Created -> Generated ->
//! (Rejected | Validated) -> Completed`. There are no retries and no loops:
//! a rejection ends the request before the executor is ever called.

use crate::db::{Catalog, ResultTable, SqlBackend};
use crate::executor::{ExecutionOutcome, QueryExecutor};
use crate::generator::QueryGenerator;
use crate::llm::LanguageModel;
use crate::schema::SchemaProvider;
use crate::validator::{QueryValidator, ValidationOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Created,
    Generated,
    Rejected,
    Validated,
    Completed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Rejected | Stage::Completed)
    }
}

/// What the request ended with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// The validator refused the SQL; nothing was executed
    Rejected(String),
    Executed(ExecutionOutcome),
}

impl Outcome {
    pub fn table(&self) -> Option<&ResultTable> {
        match self {
            Outcome::Executed(ExecutionOutcome::Rows(table)) => Some(table),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Rejected(reason) => Some(reason.clone()),
            Outcome::Executed(outcome) => outcome.message(),
        }
    }
}

/// State threaded through one request. Never shared or persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestState {
    pub user_query: String,
    pub generated_sql: String,
    /// Non-empty only when validation succeeded
    pub validated_sql: String,
    pub result: Option<Outcome>,
    pub stage: Stage,
}

impl RequestState {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            generated_sql: String::new(),
            validated_sql: String::new(),
            result: None,
            stage: Stage::Created,
        }
    }

    fn generated(&mut self, sql: String) {
        debug_assert_eq!(self.stage, Stage::Created);
        self.generated_sql = sql;
        self.stage = Stage::Generated;
    }

    fn rejected(&mut self, reason: String) {
        debug_assert_eq!(self.stage, Stage::Generated);
        self.result = Some(Outcome::Rejected(reason));
        self.stage = Stage::Rejected;
    }

    fn validated(&mut self, sql: String) {
        debug_assert_eq!(self.stage, Stage::Generated);
        self.validated_sql = sql;
        self.stage = Stage::Validated;
    }

    fn completed(&mut self, outcome: ExecutionOutcome) {
        debug_assert_eq!(self.stage, Stage::Validated);
        self.result = Some(Outcome::Executed(outcome));
        self.stage = Stage::Completed;
    }
}

/// Caller-facing result of `Pipeline::answer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub generated_sql: String,
    pub validated_sql: Option<String>,
    pub outcome: Outcome,
}

impl From<RequestState> for Answer {
    fn from(state: RequestState) -> Self {
        let validated_sql = Some(state.validated_sql).filter(|s| !s.is_empty());
        Self {
            generated_sql: state.generated_sql,
            validated_sql,
            // A finished state always carries a result; an unfinished one
            // is reported as a rejection rather than a panic.
            outcome: state
                .result
                .unwrap_or_else(|| Outcome::Rejected("Pipeline did not complete".to_string())),
        }
    }
}

/// Generator, validator and executor wired to injected collaborators
pub struct Pipeline {
    schema: SchemaProvider,
    generator: QueryGenerator,
    validator: QueryValidator,
    executor: QueryExecutor,
}

impl Pipeline {
    pub fn new(schema: SchemaProvider, generator: QueryGenerator, backend: Arc<dyn SqlBackend>) -> Self {
        Self {
            schema,
            generator,
            validator: QueryValidator::new(backend.clone()),
            executor: QueryExecutor::new(backend),
        }
    }

    /// Wire a pipeline from a language model and a database that serves
    /// both catalog and SQL
    pub fn from_parts<D>(
        llm: Arc<dyn LanguageModel>,
        database: Arc<D>,
        namespace: impl Into<String>,
        table_prefix: impl Into<String>,
    ) -> Self
    where
        D: Catalog + SqlBackend + 'static,
    {
        let catalog: Arc<dyn Catalog> = database.clone();
        Self::new(
            SchemaProvider::new(catalog, namespace),
            QueryGenerator::new(llm, table_prefix),
            database,
        )
    }

    pub async fn answer(&self, question: &str) -> Answer {
        self.process(question).await.into()
    }

    /// Run one question from a fresh state to its terminal stage and
    /// return the full state for diagnostics
    pub async fn process(&self, question: &str) -> RequestState {
        let mut state = RequestState::new(question);
        info!("Processing question: {}", state.user_query);

        let schema = self.schema.fetch_schema().await;
        let sql = self.generator.generate(&state.user_query, &schema).await;
        state.generated(sql);

        match self.validator.validate(&state.generated_sql).await {
            ValidationOutcome::Rejected(reason) => {
                info!("Request rejected: {}", reason);
                state.rejected(reason);
                return state;
            }
            ValidationOutcome::Accepted(sql) => state.validated(sql),
        }

        let outcome = self.executor.run(&state.validated_sql).await;
        state.completed(outcome);
        state
    }
}
