//! Query result types for askdb.
//!
//! Defines the structures used to represent query results from storage.

use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;
use std::time::Duration;

/// Represents the result of executing a query.
///
/// Rows are positional and aligned with `columns`; use [`QueryResult::records`]
/// for the column -> value view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column metadata for the result set, in select-list order.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    pub execution_time: Duration,

    /// Number of rows in the result (after truncation).
    pub row_count: usize,

    /// Whether the result was cut at the engine-wide row ceiling.
    pub was_truncated: bool,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            row_count,
            was_truncated: false,
        }
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the column names in order, spelled exactly as storage reports them.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns the index of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the values of one column across all rows.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    /// Returns one distinct key per column, in column order.
    ///
    /// A repeated name gets a `:N` suffix (`name`, `name:1`, ...), the same
    /// scheme SQLite uses for duplicate subquery columns.
    pub fn record_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let mut key = col.name.clone();
            let mut suffix = 0;
            while keys.contains(&key) {
                suffix += 1;
                key = format!("{}:{}", col.name, suffix);
            }
            keys.push(key);
        }
        keys
    }

    /// Returns every row as a JSON object keyed by [`record_keys`], in column
    /// order. No value is dropped when two columns share a name.
    ///
    /// [`record_keys`]: QueryResult::record_keys
    pub fn records(&self) -> Vec<Map<String, JsonValue>> {
        let keys = self.record_keys();
        self.rows
            .iter()
            .map(|row| {
                keys.iter()
                    .zip(row.iter())
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }

    /// Returns a truncation warning message if the result was truncated.
    pub fn truncation_warning(&self) -> Option<String> {
        self.was_truncated
            .then(|| format!("Result truncated to {} rows", self.row_count))
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by storage (may be empty for expressions).
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single scalar value read from, or bound into, a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text content if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Converts to a plain JSON scalar. Non-finite floats become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::String(format!("<{} bytes>", b.len())),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}
