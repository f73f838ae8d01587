// Portal storage adapter: one pooled SQLite store per portal

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info};

use super::schema::{merge_record, normalize};
use super::{
    Condition, DeleteResult, PortalInfo, PortalStats, QueryResult, Record, TableSchema, Value,
    WriteResult,
};
use crate::error::{Error, Result};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Tables the store keeps for itself; hidden from `list_tables`.
const INTERNAL_PREFIX: &str = "_mp_";

/// One operation inside an atomic batch. Ops execute in order within a
/// single transaction; any failure rolls the whole batch back, including
/// schema changes.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Write {
        table: String,
        records: Vec<Record>,
    },
    Delete {
        table: String,
        conditions: Vec<Condition>,
        all: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn write(mut self, table: &str, records: Vec<Record>) -> Self {
        self.ops.push(BatchOp::Write {
            table: table.to_string(),
            records,
        });
        self
    }

    pub fn delete_where(mut self, table: &str, conditions: Vec<Condition>) -> Self {
        self.ops.push(BatchOp::Delete {
            table: table.to_string(),
            conditions,
            all: false,
        });
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub rows_written: usize,
    pub rows_deleted: usize,
}

/// A single portal's physical store. Writers serialize on `write_lock`;
/// readers go straight to the pool and observe either a pre- or post-batch
/// snapshot thanks to transactional batches.
pub struct PortalStore {
    namespace: String,
    portal_id: String,
    db_path: PathBuf,
    pool: ConnectionPool,
    write_lock: Mutex<()>,
}

impl PortalStore {
    /// Open or create the portal store at `db_path`.
    pub fn open(namespace: &str, portal_id: &str, db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| Error::Storage(e.to_string()))?;

        let store = Self {
            namespace: namespace.to_string(),
            portal_id: portal_id.to_string(),
            db_path,
            pool,
            write_lock: Mutex::new(()),
        };
        store.init_registry()?;

        info!("Opened portal {}", store.uri());
        Ok(store)
    }

    pub fn uri(&self) -> String {
        format!("mem://{}/{}", self.namespace, self.portal_id)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn portal_id(&self) -> &str {
        &self.portal_id
    }

    pub(crate) fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// True while a writer holds the portal's write lock.
    pub(crate) fn is_writing(&self) -> bool {
        self.write_lock.try_lock().is_none()
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn init_registry(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _mp_tables (
                table_name TEXT PRIMARY KEY,
                schema_json TEXT NOT NULL,
                created_at TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS _mp_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
             );",
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO _mp_meta (key, value) VALUES ('created_at', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // --- Table lifecycle ---

    /// Create a table with an explicit schema. Idempotent when the schema
    /// matches what already exists.
    pub fn create_table(&self, table: &str, schema: &TableSchema) -> Result<()> {
        check_identifier(table)?;
        if schema.columns.is_empty() {
            return Err(Error::InvalidRecord(format!(
                "table '{}' needs at least one column",
                table
            )));
        }

        let _write = self.write_lock.lock();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        match load_schema(&tx, table)? {
            Some(existing) if existing == *schema => {}
            Some(_) => {
                return Err(Error::InvalidRecord(format!(
                    "table '{}' already exists with a different schema",
                    table
                )));
            }
            None => {
                create_physical_table(&tx, table, schema)?;
                save_schema(&tx, table, schema)?;
                debug!("Created table {} in {}", table, self.uri());
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Drop a table and its registry entry.
    pub fn drop_table(&self, table: &str) -> Result<()> {
        check_identifier(table)?;

        let _write = self.write_lock.lock();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if load_schema(&tx, table)?.is_none() {
            return Err(Error::TableNotFound(table.to_string()));
        }

        tx.execute("DELETE FROM _mp_tables WHERE table_name = ?1", params![table])?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
        tx.commit()?;

        info!("Dropped table {} from {}", table, self.uri());
        Ok(())
    }

    /// User-visible tables, in creation order.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT table_name FROM _mp_tables ORDER BY created_at, table_name")?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter(|t| !t.starts_with(INTERNAL_PREFIX))
            .collect();
        Ok(tables)
    }

    /// The inferred or explicit schema of a table.
    pub fn table_schema(&self, table: &str) -> Result<TableSchema> {
        let conn = self.conn()?;
        load_schema(&conn, table)?.ok_or_else(|| Error::TableNotFound(table.to_string()))
    }

    // --- Writes ---

    /// Append records to a table, inferring or widening its schema. The
    /// whole batch commits or none of it does.
    pub fn write(&self, table: &str, records: Vec<Record>) -> Result<WriteResult> {
        let rows = records.len();
        self.apply(WriteBatch::default().write(table, records))?;
        Ok(WriteResult {
            rows_written: rows,
            table: table.to_string(),
        })
    }

    /// Execute a batch of deletes and writes in one transaction. This is
    /// the atomic replace primitive: a failed op leaves schemas and rows
    /// exactly as they were.
    pub fn apply(&self, batch: WriteBatch) -> Result<BatchResult> {
        let _write = self.write_lock.lock();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut result = BatchResult::default();
        for op in &batch.ops {
            match op {
                BatchOp::Write { table, records } => {
                    result.rows_written += write_records(&tx, table, records)?;
                }
                BatchOp::Delete {
                    table,
                    conditions,
                    all,
                } => {
                    result.rows_deleted += delete_rows(&tx, table, conditions, *all)?;
                }
            }
        }

        tx.commit()?;
        Ok(result)
    }

    /// Delete rows matching equality conditions, or everything with
    /// `all = true`.
    pub fn delete(&self, table: &str, conditions: &[Condition], all: bool) -> Result<DeleteResult> {
        if conditions.is_empty() && !all {
            return Err(Error::InvalidRecord(
                "delete requires conditions or the explicit delete-all flag".to_string(),
            ));
        }

        let result = self.apply(WriteBatch {
            ops: vec![BatchOp::Delete {
                table: table.to_string(),
                conditions: conditions.to_vec(),
                all,
            }],
        })?;

        Ok(DeleteResult {
            rows_deleted: result.rows_deleted,
            table: table.to_string(),
        })
    }

    // --- Queries ---

    /// Run a read-only SELECT against the portal's tables. Non-SELECT
    /// statements are rejected; unknown tables map to `TableNotFound` and
    /// anything else the SQL parser dislikes to `QuerySyntax`.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let trimmed = sql.trim();
        if !trimmed.to_ascii_lowercase().starts_with("select") {
            return Err(Error::QuerySyntax(
                "only SELECT statements are allowed".to_string(),
            ));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(trimmed).map_err(map_query_error)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut rows_out = Vec::new();
        let mut rows = stmt.query([]).map_err(map_query_error)?;
        while let Some(row) = rows.next().map_err(map_query_error)? {
            let mut map = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                map.insert(name.clone(), value_ref_to_json(row.get_ref(i)?));
            }
            rows_out.push(map);
        }

        Ok(QueryResult {
            row_count: rows_out.len(),
            rows: rows_out,
            column_names,
        })
    }

    /// Row count of a single table.
    pub fn row_count(&self, table: &str) -> Result<usize> {
        check_identifier(table)?;
        let conn = self.conn()?;
        if load_schema(&conn, table)?.is_none() {
            return Err(Error::TableNotFound(table.to_string()));
        }
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // --- Stats & info ---

    pub fn stats(&self) -> Result<PortalStats> {
        let tables = self.list_tables()?;
        let mut stats = PortalStats {
            total_tables: tables.len(),
            ..Default::default()
        };

        for table in tables {
            let count = self.row_count(&table)?;
            stats.total_rows += count;
            stats.table_stats.insert(table, count);
        }

        stats.size_bytes = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);
        Ok(stats)
    }

    pub fn info(&self) -> Result<PortalInfo> {
        let conn = self.conn()?;
        let created_at: Option<String> = conn
            .query_row(
                "SELECT value FROM _mp_meta WHERE key = 'created_at'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);

        let mut tables = std::collections::BTreeMap::new();
        for table in self.list_tables()? {
            let schema = self.table_schema(&table)?;
            tables.insert(table, schema);
        }

        Ok(PortalInfo {
            uri: self.uri(),
            name: format!("{}/{}", self.namespace, self.portal_id),
            created_at: created_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
            tables,
            stats: self.stats()?,
        })
    }
}

// --- Transaction-scoped helpers ---

fn write_records(tx: &Transaction<'_>, table: &str, records: &[Record]) -> Result<usize> {
    check_identifier(table)?;
    if records.is_empty() {
        return Ok(0);
    }

    let existing = load_schema(tx, table)?;
    let mut schema = existing.clone().unwrap_or_default();
    for record in records {
        merge_record(&mut schema, record)?;
    }
    if schema.columns.is_empty() {
        return Err(Error::InvalidRecord(format!(
            "cannot infer a schema for '{}' from empty records",
            table
        )));
    }

    match &existing {
        None => create_physical_table(tx, table, &schema)?,
        Some(old) => {
            // New columns append physically; numeric promotions only touch
            // the registry (SQLite affinity already stores the wider rep).
            for column in schema.columns.iter().skip(old.columns.len()) {
                tx.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    quote_ident(table),
                    quote_ident(&column.name),
                    column.column_type.sql_type()
                ))?;
            }
        }
    }
    if existing.as_ref() != Some(&schema) {
        save_schema(tx, table, &schema)?;
    }

    let placeholders: Vec<String> = (1..=schema.columns.len()).map(|i| format!("?{}", i)).collect();
    let columns: Vec<String> = schema.columns.iter().map(|c| quote_ident(&c.name)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    );
    let mut stmt = tx.prepare(&sql)?;

    for record in records {
        let row = normalize(&schema, record)?;
        let sql_values: Vec<rusqlite::types::Value> = row.iter().map(value_to_sql).collect();
        stmt.execute(rusqlite::params_from_iter(sql_values))?;
    }

    Ok(records.len())
}

fn delete_rows(
    tx: &Transaction<'_>,
    table: &str,
    conditions: &[Condition],
    all: bool,
) -> Result<usize> {
    check_identifier(table)?;
    if load_schema(tx, table)?.is_none() {
        return Err(Error::TableNotFound(table.to_string()));
    }

    let deleted = if all {
        tx.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?
    } else {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        for (i, (field, value)) in conditions.iter().enumerate() {
            check_identifier(field)?;
            clauses.push(format!("{} = ?{}", quote_ident(field), i + 1));
            values.push(json_to_sql(value));
        }
        tx.execute(
            &format!(
                "DELETE FROM {} WHERE {}",
                quote_ident(table),
                clauses.join(" AND ")
            ),
            rusqlite::params_from_iter(values),
        )?
    };

    Ok(deleted)
}

fn create_physical_table(conn: &Connection, table: &str, schema: &TableSchema) -> Result<()> {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|c| {
            format!(
                "{} {}{}",
                quote_ident(&c.name),
                c.column_type.sql_type(),
                if c.nullable { "" } else { " NOT NULL" }
            )
        })
        .collect();
    conn.execute_batch(&format!(
        "CREATE TABLE {} ({})",
        quote_ident(table),
        columns.join(", ")
    ))?;
    Ok(())
}

fn load_schema(conn: &Connection, table: &str) -> Result<Option<TableSchema>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT schema_json FROM _mp_tables WHERE table_name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    match json {
        None => Ok(None),
        Some(json) => {
            let schema = serde_json::from_str(&json)
                .map_err(|e| Error::Storage(format!("corrupt schema registry entry: {}", e)))?;
            Ok(Some(schema))
        }
    }
}

fn save_schema(conn: &Connection, table: &str, schema: &TableSchema) -> Result<()> {
    let json = serde_json::to_string(schema)
        .map_err(|e| Error::Storage(format!("schema serialization failed: {}", e)))?;
    conn.execute(
        "INSERT INTO _mp_tables (table_name, schema_json, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(table_name) DO UPDATE SET schema_json = excluded.schema_json",
        params![table, json, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

// --- Value plumbing ---

fn value_to_sql(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Sql::Null,
        Value::Integer(i) => Sql::Integer(*i),
        Value::Float(f) => Sql::Real(*f),
        Value::Boolean(b) => Sql::Integer(*b as i64),
        Value::Text(s) => Sql::Text(s.clone()),
        Value::Timestamp(ts) => Sql::Text(ts.to_rfc3339()),
        Value::Json(v) => Sql::Text(v.to_string()),
    }
}

fn json_to_sql(value: &serde_json::Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        serde_json::Value::Null => Sql::Null,
        serde_json::Value::Bool(b) => Sql::Integer(*b as i64),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Sql::Integer(i)
            } else {
                Sql::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Sql::Text(s.clone()),
        other => Sql::Text(other.to_string()),
    }
}

fn value_ref_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Value::from(f),
        ValueRef::Text(t) => serde_json::Value::from(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => serde_json::Value::from(format!("<{} bytes>", b.len())),
    }
}

/// Table and column identifiers come from URIs and records; restrict them
/// to the URI character set so quoting is airtight.
fn check_identifier(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidRecord(format!("invalid identifier '{}'", name)))
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Map SQLite prepare/step failures onto the query taxonomy without
/// leaking the database file path.
fn map_query_error(err: rusqlite::Error) -> Error {
    let message = err.to_string();
    if let Some(rest) = message.split("no such table: ").nth(1) {
        let table = rest
            .split_whitespace()
            .next()
            .unwrap_or(rest)
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-');
        return Error::TableNotFound(table.to_string());
    }
    Error::QuerySyntax(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn store(dir: &tempfile::TempDir) -> PortalStore {
        PortalStore::open("test", "default", dir.path().join("default.db")).unwrap()
    }

    fn recs(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::Object(m) => m,
                _ => panic!("records must be objects"),
            })
            .collect()
    }

    #[test]
    fn test_write_infers_schema_and_persists() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        let result = store
            .write("users", recs(vec![json!({"name": "alice", "age": 30})]))
            .unwrap();
        assert_eq!(result.rows_written, 1);

        let schema = store.table_schema("users").unwrap();
        assert_eq!(schema.columns.len(), 2);

        let rows = store.query("SELECT name, age FROM users").unwrap();
        assert_eq!(rows.row_count, 1);
        assert_eq!(rows.rows[0]["name"], json!("alice"));
        assert_eq!(rows.rows[0]["age"], json!(30));
    }

    #[test]
    fn test_conflicting_batch_fails_atomically() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        store
            .write("users", recs(vec![json!({"name": "alice", "age": 30})]))
            .unwrap();

        // Second write conflicts on age: integer vs text. Nothing lands.
        let err = store
            .write("users", recs(vec![json!({"name": "bob", "age": "thirty"})]))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaConflict { ref field, .. } if field == "age"));

        let rows = store.query("SELECT name FROM users").unwrap();
        assert_eq!(rows.row_count, 1);
        assert_eq!(rows.rows[0]["name"], json!("alice"));

        // Schema retained its original column types.
        let schema = store.table_schema("users").unwrap();
        assert_eq!(
            schema.column("age").unwrap().column_type,
            crate::portal::ColumnType::Integer
        );
    }

    #[test]
    fn test_mixed_batch_with_late_conflict_rolls_back_all_rows() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        store.write("t", recs(vec![json!({"n": 1})])).unwrap();

        let err = store
            .write("t", recs(vec![json!({"n": 2}), json!({"n": "x"})]))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaConflict { .. }));
        assert_eq!(store.row_count("t").unwrap(), 1);
    }

    #[test]
    fn test_schema_widens_with_new_nullable_column() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        store.write("t", recs(vec![json!({"a": 1})])).unwrap();
        store.write("t", recs(vec![json!({"a": 2, "b": "x"})])).unwrap();

        let rows = store.query("SELECT a, b FROM t ORDER BY a").unwrap();
        assert_eq!(rows.rows[0]["b"], serde_json::Value::Null);
        assert_eq!(rows.rows[1]["b"], json!("x"));
    }

    #[test]
    fn test_query_nonexistent_table() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        let err = store.query("SELECT * FROM missing").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(ref t) if t == "missing"));
    }

    #[test]
    fn test_query_dropped_table() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        store.write("gone", recs(vec![json!({"a": 1})])).unwrap();
        store.drop_table("gone").unwrap();

        let err = store.query("SELECT * FROM gone").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(ref t) if t == "gone"));
        assert!(store.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_non_select_rejected() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        let err = store.query("DROP TABLE _mp_tables").unwrap_err();
        assert!(matches!(err, Error::QuerySyntax(_)));
    }

    #[test]
    fn test_malformed_query_surfaces_parser_message() {
        let dir = tempdir().unwrap();
        let store = store(&dir);
        store.write("t", recs(vec![json!({"a": 1})])).unwrap();

        let err = store.query("SELECT FROM WHERE").unwrap_err();
        match err {
            Error::QuerySyntax(msg) => assert!(!msg.contains(".db"), "leaked path: {}", msg),
            other => panic!("expected QuerySyntax, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_with_conditions() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        store
            .write(
                "t",
                recs(vec![json!({"name": "a", "n": 1}), json!({"name": "b", "n": 2})]),
            )
            .unwrap();

        let result = store
            .delete("t", &[("name".to_string(), json!("a"))], false)
            .unwrap();
        assert_eq!(result.rows_deleted, 1);
        assert_eq!(store.row_count("t").unwrap(), 1);

        assert!(store.delete("t", &[], false).is_err());
        let result = store.delete("t", &[], true).unwrap();
        assert_eq!(result.rows_deleted, 1);
    }

    #[test]
    fn test_explicit_schema_with_timestamp_and_json() {
        use crate::portal::{ColumnSchema, ColumnType};

        let dir = tempdir().unwrap();
        let store = store(&dir);

        let schema = TableSchema::new(vec![
            ColumnSchema::required("id", ColumnType::Text),
            ColumnSchema::new("at", ColumnType::Timestamp),
            ColumnSchema::new("meta", ColumnType::Json),
        ]);
        store.create_table("events", &schema).unwrap();
        // Idempotent re-create with the same schema.
        store.create_table("events", &schema).unwrap();

        store
            .write(
                "events",
                recs(vec![
                    json!({"id": "e1", "at": "2024-01-01T00:00:00Z", "meta": {"k": 1}}),
                ]),
            )
            .unwrap();

        let rows = store.query("SELECT id, at, meta FROM events").unwrap();
        assert_eq!(rows.rows[0]["id"], json!("e1"));
    }

    #[test]
    fn test_stats_and_info() {
        let dir = tempdir().unwrap();
        let store = store(&dir);

        store.write("a", recs(vec![json!({"x": 1}), json!({"x": 2})])).unwrap();
        store.write("b", recs(vec![json!({"y": "z"})])).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_tables, 2);
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.table_stats["a"], 2);

        let info = store.info().unwrap();
        assert_eq!(info.uri, "mem://test/default");
        assert!(info.tables.contains_key("b"));
    }
}
