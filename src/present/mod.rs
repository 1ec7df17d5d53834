//! Result presentation.
//!
//! Pure mapping from an answered question to the payload each consumer
//! expects: a text block, a JSON envelope, or an HTML fragment.

mod html;

pub use html::escape_html;

use serde_json::{json, Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

use crate::engine::Answer;
use crate::error::AskError;

/// Text shown for an empty result in every channel.
pub const NO_RESULTS: &str = "No results found.";

/// Output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    /// Plain text block for tool-protocol consumers.
    #[default]
    Text,
    /// Structured envelope for JSON API consumers.
    Json,
    /// Table markup for the HTML form.
    Html,
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            _ => Err(format!("Unknown output channel: {}", s)),
        }
    }
}

/// A rendered payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(JsonValue),
    Html(String),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) | Self::Html(text) => write!(f, "{}", text),
            Self::Json(value) => write!(f, "{:#}", value),
        }
    }
}

/// Renders answers and errors per channel.
pub struct ResultPresenter;

impl ResultPresenter {
    /// Renders an answered question.
    pub fn render(answer: &Answer, channel: Channel) -> Payload {
        match channel {
            Channel::Text => Payload::Text(Self::text(answer)),
            Channel::Json => Payload::Json(Self::envelope(answer)),
            Channel::Html => Payload::Html(html::table(&answer.result)),
        }
    }

    /// Renders a failure. The attempted query text is included when known.
    pub fn render_error(error: &AskError, channel: Channel) -> Payload {
        match channel {
            Channel::Text => {
                let mut text = format!("Error: {}", error.message());
                if let Some(sql) = error.sql() {
                    text.push_str(&format!("\nSQL: {}", sql));
                }
                Payload::Text(text)
            }
            Channel::Json => {
                let mut body = Map::new();
                body.insert("error".to_string(), json!(error.message()));
                body.insert("category".to_string(), json!(error.category()));
                if let Some(sql) = error.sql() {
                    body.insert("sql".to_string(), json!(sql));
                }
                Payload::Json(JsonValue::Object(body))
            }
            Channel::Html => Payload::Html(html::error_block(&error.message(), error.sql())),
        }
    }

    /// Renders the complete question page: the form with the question
    /// echoed back, then the resolved query and results or the error.
    pub fn render_page(question: &str, outcome: Option<&Result<Answer, AskError>>) -> String {
        let body = match outcome {
            None => String::new(),
            Some(Ok(answer)) => format!(
                "<div class=\"sql\"><strong>SQL Query:</strong> <code>{}</code></div>\n{}",
                escape_html(&answer.query.sql),
                html::table(&answer.result)
            ),
            Some(Err(error)) => html::error_block(&error.message(), error.sql()),
        };
        html::page(question, &body)
    }

    fn text(answer: &Answer) -> String {
        let mut text = format!("SQL Query: {}", answer.query.sql);
        if !answer.query.params.is_empty() {
            let params = answer
                .query
                .params
                .iter()
                .map(|p| p.to_json())
                .collect::<Vec<_>>();
            text.push_str(&format!("\nParameters: {}", JsonValue::Array(params)));
        }

        let result = &answer.result;
        if result.is_empty() {
            text.push_str(&format!("\n\n{}", NO_RESULTS));
            return text;
        }

        let records = result
            .records()
            .into_iter()
            .map(JsonValue::Object)
            .collect::<Vec<_>>();
        text.push_str(&format!(
            "\n\nFound {} results:\n{:#}",
            result.row_count,
            JsonValue::Array(records)
        ));

        if let Some(warning) = result.truncation_warning() {
            text.push_str(&format!("\n({})", warning));
        }
        text
    }

    fn envelope(answer: &Answer) -> JsonValue {
        let result = &answer.result;
        let mut envelope = Map::new();

        envelope.insert("sql".to_string(), json!(answer.query.sql));
        if !answer.query.params.is_empty() {
            envelope.insert("params".to_string(), json!(answer.query.params));
        }
        envelope.insert("columns".to_string(), json!(result.column_names()));
        envelope.insert(
            "results".to_string(),
            JsonValue::Array(result.records().into_iter().map(JsonValue::Object).collect()),
        );
        envelope.insert("count".to_string(), json!(result.row_count));
        if result.is_empty() {
            envelope.insert("message".to_string(), json!(NO_RESULTS));
        }
        if result.was_truncated {
            envelope.insert("truncated".to_string(), json!(true));
        }

        JsonValue::Object(envelope)
    }
}
