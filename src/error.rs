//! Error types for askdb.
//!
//! Defines the main error enum used throughout the engine.

use thiserror::Error;

/// Main error type for askdb operations.
#[derive(Error, Debug)]
pub enum AskError {
    /// Storage unreachable or the configured table does not exist.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The model-backed resolver failed. Always absorbed by the resolution policy.
    #[error("Resolution failure: {0}")]
    Resolution(String),

    /// A resolved query was malformed, rejected, or failed in storage.
    #[error("Query error: {message}\nSQL: {sql}")]
    Query {
        /// Storage or guard message.
        message: String,
        /// The offending query text.
        sql: String,
    },

    /// Caller input rejected before resolution (empty question, bad paging, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A table or resource named by the caller does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// LLM client errors (rate limits, auth, transport).
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl AskError {
    /// Creates a data-unavailable error with the given message.
    pub fn data_unavailable(msg: impl Into<String>) -> Self {
        Self::DataUnavailable(msg.into())
    }

    /// Creates a resolution failure with the given message.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Creates a query error carrying the attempted query text.
    pub fn query(msg: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Query {
            message: msg.into(),
            sql: sql.into(),
        }
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a not-found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the query text attached to this error, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Query { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Returns the error message without the category prefix or query text.
    pub fn message(&self) -> String {
        match self {
            Self::DataUnavailable(msg)
            | Self::Resolution(msg)
            | Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Llm(msg)
            | Self::Config(msg) => msg.clone(),
            Self::Query { message, .. } => message.clone(),
            Self::Cancelled => "Request cancelled".to_string(),
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::DataUnavailable(_) => "Data Unavailable",
            Self::Resolution(_) => "Resolution Failure",
            Self::Query { .. } => "Query Error",
            Self::Validation(_) => "Validation Error",
            Self::NotFound(_) => "Not Found",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Result type alias using AskError.
pub type Result<T> = std::result::Result<T, AskError>;
