// Schema inference: deterministic widening of column schemas from records

use chrono::{DateTime, Utc};

use super::{ColumnSchema, ColumnType, Record, TableSchema, Value};
use crate::error::{Error, Result};

/// Infer a schema from a single record, or merge the record into an
/// existing schema, returning the (possibly widened) schema and the record
/// normalized against it.
///
/// Deterministic: replaying the same records in the same order always
/// yields the identical schema, and a prefix of the sequence yields a
/// subset of the full sequence's columns.
pub fn infer_or_merge(
    existing: Option<&TableSchema>,
    record: &Record,
) -> Result<(TableSchema, Vec<Value>)> {
    let mut schema = existing.cloned().unwrap_or_default();
    merge_record(&mut schema, record)?;
    let row = normalize(&schema, record)?;
    Ok((schema, row))
}

/// Widen `schema` in place to accept `record`.
///
/// - Unknown fields become new nullable columns of the value's scalar type
///   (null-first fields start as Text).
/// - Integer and Float merge to Float, in either direction.
/// - Boolean and Timestamp never auto-widen; any other mismatch is a
///   `SchemaConflict` naming the field and both types. In particular an
///   integer column does NOT silently widen to text.
pub fn merge_record(schema: &mut TableSchema, record: &Record) -> Result<()> {
    for (field, value) in record {
        let incoming = match scalar_type(value) {
            Some(t) => t,
            // Null constrains nothing; a brand-new null field is Text.
            None => {
                if schema.column(field).is_none() {
                    schema
                        .columns
                        .push(ColumnSchema::new(field, ColumnType::Text));
                }
                continue;
            }
        };

        match schema.columns.iter_mut().find(|c| c.name == *field) {
            None => schema.columns.push(ColumnSchema::new(field, incoming)),
            Some(column) => match (column.column_type, incoming) {
                (existing, incoming) if existing == incoming => {}
                (ColumnType::Integer, ColumnType::Float) => {
                    column.column_type = ColumnType::Float;
                }
                (ColumnType::Float, ColumnType::Integer) => {}
                // Timestamp columns come from explicit schemas and accept
                // RFC 3339 strings without widening.
                (ColumnType::Timestamp, ColumnType::Text) if is_timestamp(value) => {}
                (existing, incoming) => {
                    return Err(Error::SchemaConflict {
                        field: field.clone(),
                        existing,
                        incoming,
                    });
                }
            },
        }
    }
    Ok(())
}

/// Validate `record` against `schema` and produce one typed value per
/// schema column, in column order. Fields absent from the record become
/// Null; required columns reject that.
pub fn normalize(schema: &TableSchema, record: &Record) -> Result<Vec<Value>> {
    for field in record.keys() {
        if schema.column(field).is_none() {
            return Err(Error::InvalidRecord(format!(
                "field '{}' is not a column of this table",
                field
            )));
        }
    }

    schema
        .columns
        .iter()
        .map(|column| match record.get(&column.name) {
            None | Some(serde_json::Value::Null) => {
                if column.nullable {
                    Ok(Value::Null)
                } else {
                    Err(Error::InvalidRecord(format!(
                        "field '{}' is required",
                        column.name
                    )))
                }
            }
            Some(value) => coerce(column, value),
        })
        .collect()
}

/// The scalar column type a JSON value maps to. Strings are always Text:
/// inference never sniffs timestamps out of string contents, which keeps
/// the result independent of the data's shape.
pub fn scalar_type(value: &serde_json::Value) -> Option<ColumnType> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(_) => Some(ColumnType::Boolean),
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Some(ColumnType::Integer)
            } else {
                Some(ColumnType::Float)
            }
        }
        serde_json::Value::String(_) => Some(ColumnType::Text),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Some(ColumnType::Json),
    }
}

fn is_timestamp(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::String(s) if DateTime::parse_from_rfc3339(s).is_ok())
}

fn coerce(column: &ColumnSchema, value: &serde_json::Value) -> Result<Value> {
    let mismatch = || Error::SchemaConflict {
        field: column.name.clone(),
        existing: column.column_type,
        incoming: scalar_type(value).unwrap_or(ColumnType::Text),
    };

    match column.column_type {
        ColumnType::Integer => value.as_i64().map(Value::Integer).ok_or_else(mismatch),
        ColumnType::Float => value.as_f64().map(Value::Float).ok_or_else(mismatch),
        ColumnType::Boolean => value.as_bool().map(Value::Boolean).ok_or_else(mismatch),
        ColumnType::Text => value
            .as_str()
            .map(|s| Value::Text(s.to_string()))
            .ok_or_else(mismatch),
        ColumnType::Timestamp => {
            let s = value.as_str().ok_or_else(mismatch)?;
            let ts = DateTime::parse_from_rfc3339(s).map_err(|e| {
                Error::InvalidRecord(format!(
                    "field '{}' is not an RFC 3339 timestamp: {}",
                    column.name, e
                ))
            })?;
            Ok(Value::Timestamp(ts.with_timezone(&Utc)))
        }
        ColumnType::Json => {
            if value.is_array() || value.is_object() {
                Ok(Value::Json(value.clone()))
            } else {
                Err(mismatch())
            }
        }
    }
}
