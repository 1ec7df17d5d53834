//! Prompt construction for LLM requests.
//!
//! The prompt is a pure function of the schema snapshot, the row cap and the
//! question, so identical inputs always produce identical requests.

use crate::db::{quote_ident, SchemaInfo};
use crate::llm::types::Message;

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str =
    "You are a SQL expert. Return only SQL queries, no explanations.";

/// User prompt template.
const USER_PROMPT_TEMPLATE: &str = r#"You are a SQL expert. Convert the user's question into a SQL query for a SQLite database.

Database Schema:
{schema}

Important notes:
- Use double quotes around column names that contain spaces or special characters
- Column names must be spelled exactly as listed, including any leading spaces
- The table name is {table}
- Limit results to {row_cap} rows unless specifically asked for more
- Write exactly one read-only SELECT statement

User question: {question}

Return ONLY the SQL query, nothing else:"#;

/// Builds the user prompt for a question.
pub fn build_user_prompt(question: &str, schema: &SchemaInfo, row_cap: u32) -> String {
    let schema_text = schema.format_for_llm();
    let table = quote_ident(&schema.table_name);
    let row_cap = row_cap.to_string();

    fill_template(
        USER_PROMPT_TEMPLATE,
        &[
            ("{schema}", schema_text.as_str()),
            ("{table}", table.as_str()),
            ("{row_cap}", row_cap.as_str()),
            ("{question}", question),
        ],
    )
}

/// Replaces placeholders in a single left-to-right pass.
///
/// Substituted text is never scanned again, so sample values or questions
/// that contain `{...}` come through verbatim.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Builds the complete message list for an LLM request.
pub fn build_messages(question: &str, schema: &SchemaInfo, row_cap: u32) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(build_user_prompt(question, schema, row_cap)),
    ]
}
