use anyhow::{Context, Result};
use clap::Parser;
use sql_agent::db::{init_pool, PgDatabase};
use sql_agent::format::render_answer;
use sql_agent::{AgentConfig, LlmClient, Pipeline};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sql-agent")]
#[command(about = "Answer questions about a PostgreSQL database with generated, validated SQL")]
struct Args {
    /// Question in natural language; omit to read questions from stdin
    question: Option<String>,

    /// PostgreSQL connection string (or set DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// LLM API key (or set LLM_API_KEY / NVIDIA_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Model id (or set LLM_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible base URL (or set LLM_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Schema whose tables are described to the model (or set SCHEMA_NAMESPACE)
    #[arg(long)]
    namespace: Option<String>,

    /// Qualifier required before every table name (or set TABLE_PREFIX)
    #[arg(long)]
    table_prefix: Option<String>,

    /// Print answers as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(&self, config: &mut AgentConfig) {
        if let Some(ref url) = self.database_url {
            config.database.url = url.clone();
        }
        if let Some(ref key) = self.api_key {
            config.llm.api_key = key.clone();
        }
        if let Some(ref model) = self.model {
            config.llm.model = model.clone();
        }
        if let Some(ref base_url) = self.base_url {
            config.llm.base_url = base_url.clone();
        }
        if let Some(ref namespace) = self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(ref prefix) = self.table_prefix {
            config.table_prefix = prefix.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AgentConfig::from_env()?;
    args.apply(&mut config);
    config.validate()?;

    let pool = init_pool(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let llm = LlmClient::new(&config.llm)?;
    info!("Using model {} at {}", config.llm.model, config.llm.base_url);

    let pipeline = Pipeline::from_parts(
        Arc::new(llm),
        Arc::new(PgDatabase::new(pool)),
        config.namespace.clone(),
        config.table_prefix.clone(),
    );

    match args.question {
        Some(ref question) => answer_one(&pipeline, question, args.json).await,
        None => run_interactive(&pipeline, args.json).await,
    }
}

async fn answer_one(pipeline: &Pipeline, question: &str, json: bool) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        println!("Por favor digite algo.");
        return Ok(());
    }

    let answer = pipeline.answer(question).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", render_answer(&answer));
    }
    Ok(())
}

/// One question per line, each fully answered before the next is read
async fn run_interactive(pipeline: &Pipeline, json: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Digite algo (e.x: 'Qual cliente comprou a maior variedade de produtos diferentes?'): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        answer_one(pipeline, &line?, json).await?;
    }
}
