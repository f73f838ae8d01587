use anyhow::{anyhow, Result};
use serde_json::json;

use crate::portal::record_from_json;

use super::{open_registry, parse_uri};

/// Write JSON records to a portal table. `data` is a JSON object or an
/// array of objects; the table schema is inferred and widened as needed.
pub async fn write(uri: String, data: String, project_dir: String) -> Result<()> {
    let uri = parse_uri(&uri)?;
    let table = uri
        .table
        .as_deref()
        .ok_or_else(|| anyhow!("write needs a table URI, e.g. mem://team/scratch/users"))?;

    let value: serde_json::Value = serde_json::from_str(&data)?;
    let records = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(record_from_json)
            .collect::<crate::error::Result<Vec<_>>>()?,
        other => vec![record_from_json(other)?],
    };

    let (_, registry) = open_registry(&project_dir);
    let handle = registry.resolve_uri(&uri)?;
    let result = handle.write(table, records)?;

    println!("Wrote {} rows to {}", result.rows_written, uri);
    Ok(())
}

/// Run a read-only SELECT against a portal.
pub async fn run_query(uri: String, sql: String, format: String, project_dir: String) -> Result<()> {
    let uri = parse_uri(&uri)?;
    let (_, registry) = open_registry(&project_dir);
    let handle = registry.resolve_uri(&uri)?;

    let result = handle.query(&sql)?;
    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result.rows)?),
        _ => {
            println!("{}", result.column_names.join(" | "));
            for row in &result.rows {
                let cells: Vec<String> = result
                    .column_names
                    .iter()
                    .map(|c| render_cell(row.get(c)))
                    .collect();
                println!("{}", cells.join(" | "));
            }
            println!("\n{} rows", result.row_count);
        }
    }
    Ok(())
}

/// Show the tables of a portal with their schemas.
pub async fn tables(uri: String, project_dir: String) -> Result<()> {
    let uri = parse_uri(&uri)?;
    let (_, registry) = open_registry(&project_dir);
    let handle = registry.resolve_uri(&uri)?;

    let tables = handle.list_tables()?;
    if tables.is_empty() {
        println!("No tables in {}", uri.portal_uri());
        return Ok(());
    }

    for table in tables {
        let schema = handle.table_schema(&table)?;
        let rows = handle.row_count(&table)?;
        println!("{} ({} rows)", table, rows);
        for column in &schema.columns {
            println!(
                "  {} {}{}",
                column.name,
                column.column_type,
                if column.nullable { "" } else { " NOT NULL" }
            );
        }
    }
    Ok(())
}

/// Drop one table from a portal.
pub async fn drop_table(uri: String, project_dir: String) -> Result<()> {
    let uri = parse_uri(&uri)?;
    let table = uri
        .table
        .as_deref()
        .ok_or_else(|| anyhow!("drop-table needs a table URI"))?;

    let (_, registry) = open_registry(&project_dir);
    let handle = registry.resolve_uri(&uri)?;
    handle.drop_table(table)?;

    println!("Dropped table {} from {}", table, uri.portal_uri());
    Ok(())
}

/// Delete rows by `field=value` conditions, or everything with `--all`.
pub async fn delete(
    uri: String,
    conditions: Vec<String>,
    all: bool,
    project_dir: String,
) -> Result<()> {
    let uri = parse_uri(&uri)?;
    let table = uri
        .table
        .as_deref()
        .ok_or_else(|| anyhow!("delete needs a table URI"))?;

    let mut parsed = Vec::new();
    for condition in &conditions {
        let (field, value) = condition
            .split_once('=')
            .ok_or_else(|| anyhow!("conditions take the form field=value, got '{}'", condition))?;
        // Bare words are strings; valid JSON literals keep their type.
        let value = serde_json::from_str(value).unwrap_or_else(|_| json!(value));
        parsed.push((field.to_string(), value));
    }

    let (_, registry) = open_registry(&project_dir);
    let handle = registry.resolve_uri(&uri)?;
    let result = handle.delete(table, &parsed, all)?;

    println!("Deleted {} rows from {}", result.rows_deleted, uri);
    Ok(())
}

/// List every portal under the storage root.
pub async fn list(project_dir: String) -> Result<()> {
    let (_, registry) = open_registry(&project_dir);
    let portals = registry.list_portals()?;

    if portals.is_empty() {
        println!("No portals");
        return Ok(());
    }
    for portal in portals {
        println!(
            "{}  ({} tables, {:.1} KB)",
            portal.uri(),
            portal.table_count,
            portal.size_bytes as f64 / 1024.0
        );
    }
    Ok(())
}

/// Delete a portal and its backing store.
pub async fn drop(uri: String, project_dir: String) -> Result<()> {
    let uri = parse_uri(&uri)?;
    let (_, registry) = open_registry(&project_dir);
    registry.drop_portal(&uri.namespace, &uri.portal_id)?;
    println!("Dropped {}", uri.portal_uri());
    Ok(())
}

/// Read the resource surface of a URI: portal metadata, or table rows.
pub async fn read(uri: String, project_dir: String) -> Result<()> {
    let uri = parse_uri(&uri)?;
    let (_, registry) = open_registry(&project_dir);
    let value = registry.read_resource(&uri)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn render_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => "NULL".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
