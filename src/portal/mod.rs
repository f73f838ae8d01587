// Portal storage: tagged values, inferred schemas, per-portal stores

pub mod registry;
pub mod schema;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;

/// An incoming semi-structured record: field name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Semantic column types. Physical representation is an adapter detail;
/// these are what inference and validation reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    Json,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "json",
        }
    }

    /// SQLite column affinity for this semantic type.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "INTEGER",
            ColumnType::Timestamp => "TEXT",
            ColumnType::Json => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed scalar or structured blob, checked against the schema at the
/// storage boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// The scalar type this value contributes to inference. `Null` carries
    /// no constraint.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
            Value::Json(_) => Some(ColumnType::Json),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Boolean(b) => serde_json::Value::from(*b),
            Value::Text(s) => serde_json::Value::from(s.clone()),
            Value::Timestamp(ts) => {
                serde_json::Value::from(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Json(v) => v.clone(),
        }
    }
}

/// One column of an inferred or explicit table schema.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: true,
        }
    }

    pub fn required(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: false,
        }
    }
}

/// Table schema: columns in insertion order. Inference only ever widens
/// this; columns are removed only by an explicit drop of the table.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Result of a write operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WriteResult {
    pub rows_written: usize,
    pub table: String,
}

/// Result of a delete operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeleteResult {
    pub rows_deleted: usize,
    pub table: String,
}

/// Result of a query: rows as field-name to JSON value maps.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryResult {
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
    pub column_names: Vec<String>,
}

/// Portal statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PortalStats {
    pub total_rows: usize,
    pub total_tables: usize,
    pub size_bytes: u64,
    pub table_stats: BTreeMap<String, usize>,
}

/// Portal metadata plus table schemas, as exposed on the resource surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PortalInfo {
    pub uri: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub tables: BTreeMap<String, TableSchema>,
    pub stats: PortalStats,
}

/// Equality condition on a delete: field name and the JSON value it must
/// equal.
pub type Condition = (String, serde_json::Value);

/// Parse a JSON object out of caller input, erroring on anything else.
pub fn record_from_json(value: serde_json::Value) -> Result<Record> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(crate::error::Error::InvalidRecord(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
