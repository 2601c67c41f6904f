//! Database connection management using sqlx

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub type DbPool = PgPool;

/// Session settings applied to every pooled connection
fn session_options(config: &DatabaseConfig) -> Vec<(&'static str, String)> {
    let mut options = Vec::new();
    if config.read_only {
        options.push(("default_transaction_read_only", "on".to_string()));
    }
    if let Some(ms) = config.statement_timeout_ms {
        options.push(("statement_timeout", ms.to_string()));
    }
    options
}

/// Initialize the database connection pool
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&config.url)?
        .options(session_options(config));

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(connect_options)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1").execute(&pool).await?;

    info!(
        "Connected to PostgreSQL (max_connections={}, read_only={})",
        config.max_connections, config.read_only
    );

    Ok(pool)
}
