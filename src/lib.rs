//! Natural-language questions to read-only SQL, checked before execution
//!
//! The pipeline generates SQL from a live schema snapshot, gates it through
//! a keyword denylist and a database plan check, and only then executes it.

pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod format;
pub mod generator;
pub mod llm;
pub mod pipeline;
pub mod schema;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AgentConfig;
pub use db::{Catalog, ColumnDescriptor, PgDatabase, ResultTable, SqlBackend};
pub use error::{AgentError, Result};
pub use executor::{ExecutionOutcome, QueryExecutor};
pub use generator::{extract_final_query, QueryGenerator};
pub use llm::{LanguageModel, LlmClient};
pub use pipeline::{Answer, Outcome, Pipeline, RequestState, Stage};
pub use schema::{SchemaProvider, SchemaSnapshot, TableDescriptor};
pub use validator::{QueryValidator, ValidationOutcome};
