//! Safety and syntax gate for generated SQL
//!
//! Two checks, cheapest first: a keyword denylist that catches destructive
//! intent whatever the syntax, then a plan check that asks the database to
//! plan the statement without running it. The SQL is never rewritten.

use crate::db::SqlBackend;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DISALLOWED_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "ALTER", "INSERT", "TRUNCATE", "EXEC", "EXECUTE", "UPDATE", "CREATE",
    "GRANT", "REVOKE", "MERGE",
];

pub const DISALLOWED_MESSAGE: &str = "Erro: A query contem operações desativadas.";

lazy_static! {
    static ref DISALLOWED_PATTERN: Regex = Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        DISALLOWED_KEYWORDS.join("|")
    ))
    .expect("denylist pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Accepted(String),
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }
}

/// First denylisted keyword found in `sql`, if any
pub fn find_disallowed_keyword(sql: &str) -> Option<&str> {
    DISALLOWED_PATTERN.find(sql).map(|m| m.as_str())
}

pub struct QueryValidator {
    backend: Arc<dyn SqlBackend>,
}

impl QueryValidator {
    pub fn new(backend: Arc<dyn SqlBackend>) -> Self {
        Self { backend }
    }

    pub async fn validate(&self, sql: &str) -> ValidationOutcome {
        if let Some(keyword) = find_disallowed_keyword(sql) {
            warn!("Rejected query containing disallowed keyword '{}'", keyword);
            return ValidationOutcome::Rejected(DISALLOWED_MESSAGE.to_string());
        }

        if let Err(e) = self.backend.explain(sql).await {
            warn!("Plan check failed: {}", e);
            return ValidationOutcome::Rejected(format!(
                "Verifique a sintaxe do código SQL {}",
                e
            ));
        }

        debug!("Query accepted");
        ValidationOutcome::Accepted(sql.to_string())
    }
}
