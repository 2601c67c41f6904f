//! SQL generation from a natural-language question

use crate::llm::LanguageModel;
use std::sync::Arc;
use tracing::{debug, warn};

pub const BEGIN_MARKER: &str = "final_version_begins";
pub const END_MARKER: &str = "final_version_ends";

pub struct QueryGenerator {
    llm: Arc<dyn LanguageModel>,
    table_prefix: String,
}

impl QueryGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, table_prefix: impl Into<String>) -> Self {
        Self {
            llm,
            table_prefix: table_prefix.into(),
        }
    }

    pub fn build_prompt(&self, question: &str, schema: &str) -> String {
        format!(
            r#"You are an expert SQL assistant that generates precise and efficient SQL queries for PostgreSQL.
Follow these rules:
1. Only generate valid **PostgreSQL SQL**.
2. Avoid using SQL commands that modify the database (**e.g., DELETE, DROP, ALTER**).
3. Ensure all column and table names exist in the database.
4. Never use `LIMIT 1`.
5. You SHOULD ALWAYS include the following string before calling any table name `{prefix}`.
6. You SHOULD ALWAYS create an alias when using the function `count`.
7. If there is any question mentioning clients, you should return the clients name instead of clients_id.
8. You SHOULD ALWAYS output the final query by beginning with the following text `{begin}` and ending with the following text `{end}`.
9. Avoid using subqueries, use common table expressions.
10. Just output the query, nothing more.

### Database Schema:
{schema}

### User Request:
{question}
"#,
            prefix = self.table_prefix,
            begin = BEGIN_MARKER,
            end = END_MARKER,
            schema = schema,
            question = question,
        )
    }

    /// Returns the extracted SQL, or an error message in its place when the
    /// model call fails. Both are plain text; the validator sorts them out.
    pub async fn generate(&self, question: &str, schema: &str) -> String {
        let prompt = self.build_prompt(question, schema);

        match self.llm.complete(&prompt).await {
            Ok(completion) => {
                let sql = extract_final_query(&completion);
                if sql.is_empty() {
                    warn!("Completion did not contain a delimited query");
                }
                debug!("Generated SQL: {}", sql);
                sql
            }
            Err(e) => {
                warn!("SQL generation failed: {}", e);
                format!("Error generating SQL: {}", e)
            }
        }
    }
}

/// Text between the first begin marker and the first end marker after it.
/// Any missing or misordered marker yields an empty string.
pub fn extract_final_query(completion: &str) -> String {
    let Some(begin) = completion.find(BEGIN_MARKER) else {
        return String::new();
    };
    let body = &completion[begin + BEGIN_MARKER.len()..];
    match body.find(END_MARKER) {
        Some(end) => body[..end].trim().to_string(),
        None => String::new(),
    }
}
