//! Runtime configuration
//!
//! Values come from environment variables (a `.env` file is loaded by the
//! binary first); CLI flags may override individual fields afterwards.

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_LLM_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "meta/llama-3.3-70b-instruct";
pub const DEFAULT_NAMESPACE: &str = "public";
pub const DEFAULT_TABLE_PREFIX: &str = "data.public.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Forces `default_transaction_read_only` on every pooled session
    pub read_only: bool,
    pub statement_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    /// Catalog namespace whose tables are shown to the model
    pub namespace: String,
    /// Qualifier the model is told to put in front of every table name
    pub table_prefix: String,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = DatabaseConfig {
            url: get("DATABASE_URL").unwrap_or_default(),
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            read_only: parse_bool_or(&get, "DB_READ_ONLY", true)?,
            statement_timeout_ms: parse_opt(&get, "DB_STATEMENT_TIMEOUT_MS")?,
        };

        let llm = LlmConfig {
            api_key: get("LLM_API_KEY")
                .or_else(|| get("NVIDIA_API_KEY"))
                .unwrap_or_default(),
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: parse_or(&get, "LLM_TEMPERATURE", 0.6)?,
            top_p: parse_or(&get, "LLM_TOP_P", 0.7)?,
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", 4096)?,
            timeout_secs: parse_or(&get, "LLM_TIMEOUT_SECS", 120)?,
        };

        Ok(Self {
            database,
            llm,
            namespace: get("SCHEMA_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            table_prefix: get("TABLE_PREFIX").unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string()),
        })
    }

    /// Check that everything needed to open connections is present
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(AgentError::Config("DATABASE_URL is not set".to_string()));
        }
        if self.llm.api_key.is_empty() {
            return Err(AgentError::Config(
                "LLM_API_KEY (or NVIDIA_API_KEY) is not set".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AgentError::Config(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AgentError::Config(format!("Invalid value for {}: {} ({})", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AgentError::Config(format!(
                "Invalid value for {}: {} (expected true/false)",
                key, raw
            ))),
        },
        None => Ok(default),
    }
}
