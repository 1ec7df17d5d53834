//! Query safety classification module.
//!
//! Parses SQL and classifies statements as safe, mutating, or destructive.
//! The engine only ever executes text that classifies as exactly one safe
//! statement; see [`ensure_read_only`].

mod parser;

pub use parser::{classify_sql, row_bound, RowBound, SqlClassifier};

use crate::error::{AskError, Result};
use std::fmt;

/// Safety level classification for SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SafetyLevel {
    /// Read-only statements (SELECT, WITH ... SELECT, VALUES, EXPLAIN).
    Safe,
    /// Data modification (INSERT, UPDATE, MERGE).
    Mutating,
    /// Data loss, schema changes, or anything unrecognized
    /// (DELETE, DROP, ALTER, CREATE, PRAGMA, ATTACH, ...).
    Destructive,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Pragma,
    Attach,
    Explain,
    Merge,
    /// Multiple statements detected; contains the most dangerous type.
    Multiple(Box<StatementType>),
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::Attach => write!(f, "ATTACH"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Merge => write!(f, "MERGE"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The determined safety level.
    pub level: SafetyLevel,
    /// The type of statement(s) detected.
    pub statement_type: StatementType,
    /// Number of statements parsed from the text.
    pub statement_count: usize,
    /// Why the text was classified this way, when it is not plainly safe.
    pub warning: Option<String>,
}

impl ClassificationResult {
    /// Creates a classification for a single statement.
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
            statement_count: 1,
            warning: None,
        }
    }

    /// Creates a classification with a warning message.
    pub fn with_warning(
        level: SafetyLevel,
        statement_type: StatementType,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            level,
            statement_type,
            statement_count: 1,
            warning: Some(warning.into()),
        }
    }

    /// Returns true if the text is exactly one read-only statement.
    pub fn is_read_only(&self) -> bool {
        self.level == SafetyLevel::Safe && self.statement_count == 1
    }
}

/// Verifies that `sql` is exactly one read-only statement.
///
/// Fails with a `Query` error naming the rejected statement type and carrying
/// the statement text.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let classification = classify_sql(sql);
    if classification.is_read_only() {
        return Ok(());
    }

    let reason = if classification.statement_count > 1 {
        format!(
            "Only a single statement is allowed, found {}",
            classification.statement_count
        )
    } else if let Some(warning) = classification.warning {
        warning
    } else {
        format!(
            "Only read-only queries are allowed, got {}",
            classification.statement_type
        )
    };
    Err(AskError::query(reason, sql))
}
