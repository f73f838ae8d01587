// Portal registry: URI to live store handles, plus the resource read surface

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, info};

use super::store::PortalStore;
use crate::error::{Error, Result};
use crate::uri::MemoryUri;

/// A shared, live portal. Cloning is cheap; the registry keeps one clone
/// alive until the portal is dropped or the registry shuts down.
pub type PortalHandle = Arc<PortalStore>;

/// Hard cap on rows returned through the resource surface. Larger result
/// sets must go through the query operation.
const RESOURCE_ROW_CAP: usize = 1000;

/// Summary line for portal listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PortalSummary {
    pub namespace: String,
    pub portal_id: String,
    pub table_count: usize,
    pub size_bytes: u64,
}

impl PortalSummary {
    pub fn uri(&self) -> String {
        format!("mem://{}/{}", self.namespace, self.portal_id)
    }
}

/// Maps (namespace, portal_id) to open stores. Resolution is idempotent:
/// every caller of the same URI shares one handle, so the per-portal write
/// lock actually serializes writers.
pub struct PortalRegistry {
    base_path: PathBuf,
    portals: DashMap<(String, String), PortalHandle>,
}

impl PortalRegistry {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            portals: DashMap::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn db_path(&self, namespace: &str, portal_id: &str) -> PathBuf {
        self.base_path.join(namespace).join(format!("{}.db", portal_id))
    }

    /// Open (or create) the portal and return its shared handle. Repeated
    /// calls return the same handle.
    pub fn resolve(&self, namespace: &str, portal_id: &str) -> Result<PortalHandle> {
        let key = (namespace.to_string(), portal_id.to_string());
        if let Some(handle) = self.portals.get(&key) {
            return Ok(handle.clone());
        }

        // Open under the entry lock; drop_portal holds the same lock while
        // it unlinks, so a store is never opened against a file mid-drop.
        match self.portals.entry(key) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let store = Arc::new(PortalStore::open(
                    namespace,
                    portal_id,
                    self.db_path(namespace, portal_id),
                )?);
                Ok(vacant.insert(store).clone())
            }
        }
    }

    pub fn resolve_uri(&self, uri: &MemoryUri) -> Result<PortalHandle> {
        self.resolve(&uri.namespace, &uri.portal_id)
    }

    /// All portals: open handles plus anything discoverable on disk.
    pub fn list_portals(&self) -> Result<Vec<PortalSummary>> {
        let mut keys: Vec<(String, String)> = self
            .portals
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        if self.base_path.is_dir() {
            for ns_entry in std::fs::read_dir(&self.base_path)? {
                let ns_entry = ns_entry?;
                if !ns_entry.file_type()?.is_dir() {
                    continue;
                }
                let namespace = ns_entry.file_name().to_string_lossy().to_string();
                for db_entry in std::fs::read_dir(ns_entry.path())? {
                    let path = db_entry?.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("db") {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        keys.push((namespace.clone(), stem.to_string()));
                    }
                }
            }
        }

        keys.sort();
        keys.dedup();

        let mut summaries = Vec::with_capacity(keys.len());
        for (namespace, portal_id) in keys {
            let handle = self.resolve(&namespace, &portal_id)?;
            let stats = handle.stats()?;
            summaries.push(PortalSummary {
                namespace,
                portal_id,
                table_count: stats.total_tables,
                size_bytes: stats.size_bytes,
            });
        }
        Ok(summaries)
    }

    /// Close and delete a portal. Refuses while anyone else holds the
    /// handle or a write is in flight.
    pub fn drop_portal(&self, namespace: &str, portal_id: &str) -> Result<()> {
        let key = (namespace.to_string(), portal_id.to_string());
        let path = self.db_path(namespace, portal_id);

        // The entry guard stays held across the in-use check and the
        // unlink, so a concurrent resolve cannot reopen the store and end
        // up writing to a deleted file.
        match self.portals.entry(key) {
            Entry::Occupied(occupied) => {
                // The map owns exactly one clone; any higher count means a
                // live borrower somewhere else.
                if Arc::strong_count(occupied.get()) > 1 || occupied.get().is_writing() {
                    return Err(Error::PortalInUse {
                        namespace: namespace.to_string(),
                        portal_id: portal_id.to_string(),
                    });
                }
                if path.exists() {
                    std::fs::remove_file(&path)?;
                }
                occupied.remove();
                info!("Dropped portal mem://{}/{}", namespace, portal_id);
            }
            Entry::Vacant(_) => {
                if path.exists() {
                    std::fs::remove_file(&path)?;
                    info!("Dropped portal mem://{}/{}", namespace, portal_id);
                } else {
                    debug!(
                        "Drop of mem://{}/{} found no on-disk store",
                        namespace, portal_id
                    );
                }
            }
        }
        Ok(())
    }

    /// Release every open handle. On-disk stores are untouched.
    pub fn close_all(&self) {
        self.portals.clear();
    }

    /// The read-only resource surface. A portal URI yields metadata and
    /// table schemas; a portal+table URI yields up to 1000 rows, with
    /// `?limit=` only ever lowering that cap.
    pub fn read_resource(&self, uri: &MemoryUri) -> Result<serde_json::Value> {
        let handle = self.resolve_uri(uri)?;

        let Some(table) = &uri.table else {
            let info = handle.info()?;
            return serde_json::to_value(&info)
                .map_err(|e| Error::Storage(format!("portal info serialization: {}", e)));
        };

        let mut limit = RESOURCE_ROW_CAP;
        if let Some(raw) = uri.query_params.get("limit") {
            let requested: usize = raw.parse().map_err(|_| Error::MalformedUri {
                uri: uri.to_string(),
                reason: format!("limit must be a non-negative integer, got '{}'", raw),
            })?;
            limit = limit.min(requested);
        }

        let result = handle.query(&format!("SELECT * FROM \"{}\" LIMIT {}", table, limit))?;
        let truncated = handle.row_count(table)? > result.row_count;
        Ok(json!({
            "uri": uri.to_string(),
            "table": table,
            "row_count": result.row_count,
            "truncated": truncated,
            "columns": result.column_names,
            "rows": result.rows,
        }))
    }
}
