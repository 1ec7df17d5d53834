//! Table schema snapshot types.
//!
//! Column names are kept byte-exact. Source datasets sometimes carry stray
//! whitespace in headers (`" CompanyNumber"`), and every query we emit must
//! use the stored spelling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Immutable description of the single queryable table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Table name.
    #[serde(rename = "table")]
    pub table_name: String,

    /// Columns in declaration order.
    pub columns: Vec<Column>,

    /// A few rows for model context, keyed by column name.
    #[serde(rename = "sample_data")]
    pub sample_rows: Vec<Map<String, JsonValue>>,
}

impl SchemaInfo {
    /// Creates a snapshot with no sample rows.
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            sample_rows: Vec::new(),
        }
    }

    /// Attaches sample rows.
    pub fn with_sample_rows(mut self, sample_rows: Vec<Map<String, JsonValue>>) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    /// Returns true if a column with exactly this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Finds the stored spelling for a logical column name.
    ///
    /// An exact match wins. Otherwise the unique column whose name differs only
    /// by surrounding whitespace is returned. Ambiguous or absent names yield `None`.
    pub fn resolve_column(&self, logical: &str) -> Option<&str> {
        if let Some(col) = self.columns.iter().find(|c| c.name == logical) {
            return Some(&col.name);
        }

        let mut candidates = self
            .columns
            .iter()
            .filter(|c| c.name.trim() == logical.trim());
        match (candidates.next(), candidates.next()) {
            (Some(col), None) => Some(&col.name),
            _ => None,
        }
    }

    /// Formats the snapshot for inclusion in an LLM prompt.
    pub fn format_for_llm(&self) -> String {
        let column_lines = self
            .columns
            .iter()
            .map(|c| format!("  - {}: {}\n", quote_ident(&c.name), c.data_type))
            .collect::<Vec<_>>()
            .join("");

        let samples = if self.sample_rows.is_empty() {
            String::new()
        } else {
            let rows = self
                .sample_rows
                .iter()
                .map(|row| format!("  {}\n", JsonValue::Object(row.clone())))
                .collect::<Vec<_>>()
                .join("");
            format!("\nSample rows:\n{}", rows)
        };

        format!(
            "Table: {}\nColumns:\n{}{}",
            quote_ident(&self.table_name),
            column_lines,
            samples
        )
    }
}

/// A column of the snapshot table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, exactly as stored.
    pub name: String,

    /// Declared type (e.g., "TEXT", "INTEGER"). May be empty in SQLite.
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Column {
    /// Creates a new column with the given name and declared type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Quotes an identifier for SQLite, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
