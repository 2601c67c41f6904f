//! Terminal rendering of answers

use crate::db::ResultTable;
use crate::executor::ExecutionOutcome;
use crate::pipeline::{Answer, Outcome};
use serde_json::Value;

/// Maximum column width before truncation
const MAX_COLUMN_WIDTH: usize = 40;

pub const EMPTY_OUTPUT_MESSAGE: &str = "O retorno da query foi vazio.";

/// Render an answer the way the interactive front end shows it: the
/// generated SQL first, then either a table or a message.
pub fn render_answer(answer: &Answer) -> String {
    let mut out = String::new();
    out.push_str("### SQL gerado\n");
    out.push_str(&answer.generated_sql);
    out.push_str("\n\n### Output:\n");

    match &answer.outcome {
        Outcome::Executed(ExecutionOutcome::Rows(table)) => out.push_str(&render_table(table)),
        Outcome::Executed(ExecutionOutcome::Empty) => out.push_str(EMPTY_OUTPUT_MESSAGE),
        Outcome::Executed(ExecutionOutcome::Failure(msg)) | Outcome::Rejected(msg) => {
            out.push_str(msg)
        }
    }
    out.push('\n');
    out
}

pub fn render_table(table: &ResultTable) -> String {
    let string_rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| truncate_value(&format_value(v), MAX_COLUMN_WIDTH))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &string_rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");

    let mut out = String::new();
    out.push_str(&format_line(&table.columns, &widths));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in &string_rows {
        out.push_str(&format_line(row, &widths));
        out.push('\n');
    }
    let count = table.row_count();
    out.push_str(&format!("({} {})", count, if count == 1 { "row" } else { "rows" }));
    out
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!(" {:<width$} ", cell, width = w))
        .collect::<Vec<_>>()
        .join("|")
        .trim_end()
        .to_string()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate_value(value: &str, max_width: usize) -> String {
    if value.chars().count() <= max_width {
        value.to_string()
    } else {
        let take = max_width.saturating_sub(3);
        format!("{}...", value.chars().take(take).collect::<String>())
    }
}
