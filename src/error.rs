use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// Bare database diagnostic, without a prefix, so callers can embed it
    /// in their own user-facing messages.
    #[error("{0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for AgentError {
    fn from(err: sqlx::Error) -> Self {
        // Prefer the server's own message when Postgres raised the error
        match err.as_database_error() {
            Some(db_err) => AgentError::Database(db_err.message().to_string()),
            None => AgentError::Database(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Llm(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_has_no_prefix() {
        let err = AgentError::Database("relation \"clients\" does not exist".to_string());
        assert_eq!(err.to_string(), "relation \"clients\" does not exist");
    }

    #[test]
    fn test_sqlx_error_converts_to_database() {
        let err: AgentError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AgentError::Database(_)));
    }
}
