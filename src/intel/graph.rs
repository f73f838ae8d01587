// Graph persistence and queries over a portal store

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use super::{
    Dependency, EdgeRecord, FileRecord, Project, ProjectStats, Reference, ReferenceSet,
    SymbolKind, SymbolMatch, SymbolRecord,
};
use crate::auth::AuthContext;
use crate::error::{Error, Result};
use crate::portal::registry::PortalHandle;
use crate::portal::store::WriteBatch;
use crate::portal::{ColumnSchema, ColumnType, Record, TableSchema};

/// Feature flag gating graph writes.
pub const CODE_INTEL_FLAG: &str = "code_intel";

const PROJECTS: &str = "_ci_projects";
const FILES: &str = "_ci_files";
const SYMBOLS: &str = "_ci_symbols";
const EDGES: &str = "_ci_edges";

/// The code knowledge graph, persisted as four explicitly-schemed tables
/// inside one portal. All mutation goes through atomic write batches so
/// concurrent readers see a file fully indexed or not at all.
pub struct CodeGraph {
    portal: PortalHandle,
}

impl CodeGraph {
    /// Open the graph inside `portal`, creating its tables on first use.
    pub fn open(portal: PortalHandle) -> Result<Self> {
        let graph = Self { portal };
        graph.ensure_tables()?;
        Ok(graph)
    }

    fn ensure_tables(&self) -> Result<()> {
        self.portal.create_table(
            PROJECTS,
            &TableSchema::new(vec![
                ColumnSchema::required("id", ColumnType::Text),
                ColumnSchema::required("name", ColumnType::Text),
                ColumnSchema::required("root", ColumnType::Text),
                ColumnSchema::required("organization_id", ColumnType::Text),
                ColumnSchema::required("created_at", ColumnType::Timestamp),
            ]),
        )?;
        self.portal.create_table(
            FILES,
            &TableSchema::new(vec![
                ColumnSchema::required("project_id", ColumnType::Text),
                ColumnSchema::required("path", ColumnType::Text),
                ColumnSchema::required("language", ColumnType::Text),
                ColumnSchema::required("fingerprint", ColumnType::Text),
                ColumnSchema::required("line_count", ColumnType::Integer),
                ColumnSchema::required("symbol_count", ColumnType::Integer),
                ColumnSchema::required("edge_count", ColumnType::Integer),
                ColumnSchema::required("indexed_at", ColumnType::Timestamp),
            ]),
        )?;
        self.portal.create_table(
            SYMBOLS,
            &TableSchema::new(vec![
                ColumnSchema::required("project_id", ColumnType::Text),
                ColumnSchema::required("path", ColumnType::Text),
                ColumnSchema::required("name", ColumnType::Text),
                ColumnSchema::required("kind", ColumnType::Text),
                ColumnSchema::required("start_line", ColumnType::Integer),
                ColumnSchema::required("end_line", ColumnType::Integer),
                ColumnSchema::new("signature", ColumnType::Text),
                ColumnSchema::new("parent", ColumnType::Text),
            ]),
        )?;
        self.portal.create_table(
            EDGES,
            &TableSchema::new(vec![
                ColumnSchema::required("project_id", ColumnType::Text),
                ColumnSchema::required("path", ColumnType::Text),
                ColumnSchema::required("kind", ColumnType::Text),
                ColumnSchema::required("source", ColumnType::Text),
                ColumnSchema::required("target", ColumnType::Text),
                ColumnSchema::required("line", ColumnType::Integer),
                ColumnSchema::new("metadata", ColumnType::Json),
            ]),
        )?;
        Ok(())
    }

    // --- Projects ---

    /// Create a project for the caller's organization. Requires the
    /// code-intel feature flag; project names are unique per graph.
    pub fn create_project(&self, ctx: &AuthContext, name: &str, root: &str) -> Result<Project> {
        ctx.require_feature(CODE_INTEL_FLAG)?;

        if self.get_project(name)?.is_some() {
            return Err(Error::InvalidRecord(format!(
                "project '{}' already exists",
                name
            )));
        }

        let created_at = Utc::now();
        let digest = blake3::hash(
            format!("{}|{}|{}", name, ctx.organization_id, created_at.to_rfc3339()).as_bytes(),
        );
        let id = format!("p-{}", &digest.to_hex().as_str()[..12]);

        self.portal.write(
            PROJECTS,
            vec![rec(json!({
                "id": id,
                "name": name,
                "root": root,
                "organization_id": ctx.organization_id,
                "created_at": created_at.to_rfc3339(),
            }))],
        )?;

        debug!("Created project {} ({})", name, id);
        Ok(Project {
            id,
            name: name.to_string(),
            root: root.to_string(),
            organization_id: ctx.organization_id.clone(),
            created_at,
        })
    }

    pub fn get_project(&self, name: &str) -> Result<Option<Project>> {
        let result = self.portal.query(&format!(
            "SELECT id, name, root, organization_id, created_at FROM {} WHERE name = {}",
            PROJECTS,
            sql_str(name)
        ))?;
        Ok(result.rows.first().map(row_to_project))
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let result = self.portal.query(&format!(
            "SELECT id, name, root, organization_id, created_at FROM {} ORDER BY name",
            PROJECTS
        ))?;
        Ok(result.rows.iter().map(row_to_project).collect())
    }

    /// Delete a project and everything indexed under it, atomically.
    pub fn delete_project(&self, project_id: &str) -> Result<()> {
        let by_project = vec![("project_id".to_string(), json!(project_id))];
        self.portal.apply(
            WriteBatch::default()
                .delete_where(EDGES, by_project.clone())
                .delete_where(SYMBOLS, by_project.clone())
                .delete_where(FILES, by_project)
                .delete_where(PROJECTS, vec![("id".to_string(), json!(project_id))]),
        )?;
        Ok(())
    }

    /// How many projects an organization currently has. Consumed by the
    /// tier-gating collaborator; no limit is enforced here.
    pub fn current_project_count(&self, organization_id: &str) -> Result<usize> {
        let result = self.portal.query(&format!(
            "SELECT COUNT(*) AS n FROM {} WHERE organization_id = {}",
            PROJECTS,
            sql_str(organization_id)
        ))?;
        Ok(result.rows.first().map(|r| row_usize(r, "n")).unwrap_or(0))
    }

    // --- File contents ---

    /// Replace everything indexed for one path in one atomic batch.
    pub fn replace_file(
        &self,
        project_id: &str,
        file: &FileRecord,
        symbols: &[SymbolRecord],
        edges: &[EdgeRecord],
    ) -> Result<()> {
        let owned = vec![
            ("project_id".to_string(), json!(project_id)),
            ("path".to_string(), json!(file.path)),
        ];

        let mut batch = WriteBatch::default()
            .delete_where(EDGES, owned.clone())
            .delete_where(SYMBOLS, owned.clone())
            .delete_where(FILES, owned)
            .write(
                FILES,
                vec![rec(json!({
                    "project_id": project_id,
                    "path": file.path,
                    "language": file.language,
                    "fingerprint": file.fingerprint,
                    "line_count": file.line_count,
                    "symbol_count": file.symbol_count,
                    "edge_count": file.edge_count,
                    "indexed_at": file.indexed_at.to_rfc3339(),
                }))],
            );

        if !symbols.is_empty() {
            let rows = symbols
                .iter()
                .map(|s| {
                    rec(json!({
                        "project_id": project_id,
                        "path": file.path,
                        "name": s.name,
                        "kind": s.kind.as_str(),
                        "start_line": s.start_line,
                        "end_line": s.end_line,
                        "signature": s.signature,
                        "parent": s.parent,
                    }))
                })
                .collect();
            batch = batch.write(SYMBOLS, rows);
        }

        if !edges.is_empty() {
            let rows = edges
                .iter()
                .map(|e| {
                    rec(json!({
                        "project_id": project_id,
                        "path": file.path,
                        "kind": e.kind.as_str(),
                        "source": e.source,
                        "target": e.target,
                        "line": e.line,
                    }))
                })
                .collect();
            batch = batch.write(EDGES, rows);
        }

        self.portal.apply(batch)?;
        Ok(())
    }

    /// The stored fingerprint of a path, if it was ever indexed.
    pub fn file_fingerprint(&self, project_id: &str, path: &str) -> Result<Option<String>> {
        let result = self.portal.query(&format!(
            "SELECT fingerprint FROM {} WHERE project_id = {} AND path = {}",
            FILES,
            sql_str(project_id),
            sql_str(path)
        ))?;
        Ok(result.rows.first().map(|r| row_str(r, "fingerprint")))
    }

    // --- Queries ---

    /// Find symbols by name pattern (`*` wildcards) and optional kind.
    pub fn find_symbols(
        &self,
        project_id: &str,
        pattern: &str,
        kind: Option<SymbolKind>,
        limit: usize,
    ) -> Result<Vec<SymbolMatch>> {
        let like = pattern.replace('*', "%");
        let mut sql = format!(
            "SELECT path, name, kind, start_line, end_line, signature, parent \
             FROM {} WHERE project_id = {} AND name LIKE {}",
            SYMBOLS,
            sql_str(project_id),
            sql_str(&like)
        );
        if let Some(kind) = kind {
            sql.push_str(&format!(" AND kind = {}", sql_str(kind.as_str())));
        }
        sql.push_str(&format!(" ORDER BY path, start_line LIMIT {}", limit));

        let result = self.portal.query(&sql)?;
        result
            .rows
            .iter()
            .map(|row| {
                Ok(SymbolMatch {
                    file: row_str(row, "path"),
                    name: row_str(row, "name"),
                    kind: SymbolKind::parse(&row_str(row, "kind"))?,
                    start_line: row_usize(row, "start_line"),
                    end_line: row_usize(row, "end_line"),
                    signature: row_opt_str(row, "signature"),
                    parent: row_opt_str(row, "parent"),
                })
            })
            .collect()
    }

    /// Every call site referencing `name`, resolved by name at query time.
    /// Dangling targets are reported, not retried: `resolved` flips to
    /// true once the defining file gets indexed.
    pub fn find_references(&self, project_id: &str, name: &str) -> Result<ReferenceSet> {
        let result = self.portal.query(&format!(
            "SELECT path, source, line FROM {} \
             WHERE project_id = {} AND kind = 'references' AND target = {} \
             ORDER BY path, line",
            EDGES,
            sql_str(project_id),
            sql_str(name)
        ))?;

        let references = result
            .rows
            .iter()
            .map(|row| Reference {
                file: row_str(row, "path"),
                from_symbol: row_str(row, "source"),
                line: row_usize(row, "line"),
            })
            .collect();

        let definitions = self.portal.query(&format!(
            "SELECT COUNT(*) AS n FROM {} WHERE project_id = {} AND name = {}",
            SYMBOLS,
            sql_str(project_id),
            sql_str(name)
        ))?;
        let resolved = definitions.rows.first().map(|r| row_usize(r, "n")).unwrap_or(0) > 0;

        Ok(ReferenceSet {
            target: name.to_string(),
            resolved,
            references,
        })
    }

    /// Transitive imports of `path`, breadth-first with a visited set so
    /// circular imports terminate. Module names resolve to indexed files
    /// opportunistically; unresolved ones stay in the result as external.
    /// `None` means unbounded; the visited set alone guarantees
    /// termination.
    pub fn get_dependencies(
        &self,
        project_id: &str,
        path: &str,
        max_depth: Option<usize>,
    ) -> Result<Vec<Dependency>> {
        let max_depth = max_depth.unwrap_or(usize::MAX);
        let stems = self.file_stems(project_id)?;

        let mut deps = Vec::new();
        let mut seen_modules: HashSet<String> = HashSet::new();
        let mut visited_files: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();

        visited_files.insert(path.to_string());
        queue.push_back((path.to_string(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for module in self.imports_of(project_id, &current)? {
                if !seen_modules.insert(module.clone()) {
                    continue;
                }
                let resolved = resolve_module(&stems, &module);
                deps.push(Dependency {
                    module,
                    file: resolved.clone(),
                    depth: depth + 1,
                });
                if let Some(file) = resolved {
                    if visited_files.insert(file.clone()) {
                        queue.push_back((file, depth + 1));
                    }
                }
            }
        }

        Ok(deps)
    }

    fn imports_of(&self, project_id: &str, path: &str) -> Result<Vec<String>> {
        let result = self.portal.query(&format!(
            "SELECT target FROM {} \
             WHERE project_id = {} AND kind = 'imports' AND path = {} ORDER BY line",
            EDGES,
            sql_str(project_id),
            sql_str(path)
        ))?;
        Ok(result.rows.iter().map(|row| row_str(row, "target")).collect())
    }

    /// Indexed file paths keyed by their stem, for module resolution.
    fn file_stems(&self, project_id: &str) -> Result<HashMap<String, String>> {
        let result = self.portal.query(&format!(
            "SELECT path FROM {} WHERE project_id = {} ORDER BY path",
            FILES,
            sql_str(project_id)
        ))?;

        let mut stems = HashMap::new();
        for row in &result.rows {
            let path = row_str(row, "path");
            if let Some(stem) = std::path::Path::new(&path)
                .file_stem()
                .and_then(|s| s.to_str())
            {
                // First path wins on stem collisions; kept deterministic by
                // the ordered scan.
                stems.entry(stem.to_string()).or_insert(path);
            }
        }
        Ok(stems)
    }

    /// Aggregate counts for a project.
    pub fn stats(&self, project_id: &str) -> Result<ProjectStats> {
        let mut stats = ProjectStats::default();

        let files = self.portal.query(&format!(
            "SELECT language, COUNT(*) AS n, MAX(indexed_at) AS last FROM {} \
             WHERE project_id = {} GROUP BY language",
            FILES,
            sql_str(project_id)
        ))?;
        for row in &files.rows {
            let count = row_usize(row, "n");
            stats.files += count;
            stats.files_by_language.insert(row_str(row, "language"), count);
            if let Some(last) = row_opt_str(row, "last") {
                let parsed = DateTime::parse_from_rfc3339(&last)
                    .map(|t| t.with_timezone(&Utc))
                    .ok();
                if parsed > stats.last_indexed {
                    stats.last_indexed = parsed;
                }
            }
        }

        let symbols = self.portal.query(&format!(
            "SELECT COUNT(*) AS n FROM {} WHERE project_id = {}",
            SYMBOLS,
            sql_str(project_id)
        ))?;
        stats.symbols = symbols.rows.first().map(|r| row_usize(r, "n")).unwrap_or(0);

        let edges = self.portal.query(&format!(
            "SELECT COUNT(*) AS n FROM {} WHERE project_id = {}",
            EDGES,
            sql_str(project_id)
        ))?;
        stats.edges = edges.rows.first().map(|r| row_usize(r, "n")).unwrap_or(0);

        Ok(stats)
    }
}

/// Match a module name to an indexed file by its final segment:
/// `utils`, `pkg.utils`, `./utils.js`, and `crate::utils` all resolve to
/// a file whose stem is `utils`.
fn resolve_module(stems: &HashMap<String, String>, module: &str) -> Option<String> {
    let last = module
        .rsplit(|c| c == '.' || c == '/' || c == ':')
        .find(|s| !s.is_empty())?;
    // Path-style imports keep their extension in the last dot-segment.
    let stem = std::path::Path::new(module)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(last);

    stems
        .get(stem)
        .or_else(|| stems.get(last))
        .cloned()
}

fn rec(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("graph rows are always objects"),
    }
}

fn sql_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn row_str(row: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    row.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string()
}

fn row_opt_str(row: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    row.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn row_usize(row: &serde_json::Map<String, serde_json::Value>, key: &str) -> usize {
    row.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as usize
}

fn row_to_project(row: &serde_json::Map<String, serde_json::Value>) -> Project {
    Project {
        id: row_str(row, "id"),
        name: row_str(row, "name"),
        root: row_str(row, "root"),
        organization_id: row_str(row, "organization_id"),
        created_at: row_opt_str(row, "created_at")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::EdgeKind;
    use crate::portal::registry::PortalRegistry;
    use tempfile::tempdir;

    fn graph(dir: &tempfile::TempDir) -> CodeGraph {
        let registry = PortalRegistry::new(dir.path());
        let portal = registry.resolve("test-org", "code").unwrap();
        CodeGraph::open(portal).unwrap()
    }

    fn ctx() -> AuthContext {
        AuthContext::new("dev-1", "test-org").with_flag(CODE_INTEL_FLAG)
    }

    fn file_record(path: &str, language: &str, fingerprint: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            language: language.to_string(),
            fingerprint: fingerprint.to_string(),
            line_count: 10,
            symbol_count: 0,
            edge_count: 0,
            indexed_at: Utc::now(),
        }
    }

    fn sym(name: &str, kind: SymbolKind, line: usize) -> SymbolRecord {
        SymbolRecord {
            name: name.to_string(),
            kind,
            start_line: line,
            end_line: line + 2,
            signature: None,
            parent: None,
        }
    }

    fn edge(kind: EdgeKind, source: &str, target: &str, line: usize) -> EdgeRecord {
        EdgeRecord {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            line,
        }
    }

    #[test]
    fn test_project_lifecycle() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);

        let project = graph.create_project(&ctx(), "demo", "/work/demo").unwrap();
        assert!(project.id.starts_with("p-"));
        assert_eq!(graph.current_project_count("test-org").unwrap(), 1);
        assert_eq!(graph.current_project_count("other-org").unwrap(), 0);

        // Duplicate names are rejected.
        assert!(graph.create_project(&ctx(), "demo", "/elsewhere").is_err());

        let loaded = graph.get_project("demo").unwrap().unwrap();
        assert_eq!(loaded.id, project.id);
        assert_eq!(loaded.organization_id, "test-org");

        graph.delete_project(&project.id).unwrap();
        assert!(graph.get_project("demo").unwrap().is_none());
        assert_eq!(graph.current_project_count("test-org").unwrap(), 0);
    }

    #[test]
    fn test_create_project_requires_feature_flag() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);

        let no_flag = AuthContext::new("dev-1", "test-org");
        let err = graph.create_project(&no_flag, "demo", "/work").unwrap_err();
        assert!(matches!(err, Error::FeatureDisabled(_)));
    }

    #[test]
    fn test_replace_file_swaps_old_rows_atomically() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        graph
            .replace_file(
                &project.id,
                &file_record("app.py", "python", "v1"),
                &[sym("old_fn", SymbolKind::Function, 1)],
                &[edge(EdgeKind::References, "old_fn", "helper", 2)],
            )
            .unwrap();

        graph
            .replace_file(
                &project.id,
                &file_record("app.py", "python", "v2"),
                &[sym("new_fn", SymbolKind::Function, 1)],
                &[],
            )
            .unwrap();

        let matches = graph.find_symbols(&project.id, "*", None, 100).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "new_fn");

        assert_eq!(
            graph.file_fingerprint(&project.id, "app.py").unwrap(),
            Some("v2".to_string())
        );
        assert_eq!(graph.file_fingerprint(&project.id, "gone.py").unwrap(), None);

        // The old reference edge went with the old version.
        let refs = graph.find_references(&project.id, "helper").unwrap();
        assert!(refs.references.is_empty());
    }

    #[test]
    fn test_find_symbols_by_pattern_and_kind() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        graph
            .replace_file(
                &project.id,
                &file_record("app.py", "python", "v1"),
                &[
                    sym("get_user", SymbolKind::Function, 1),
                    sym("get_order", SymbolKind::Function, 5),
                    sym("User", SymbolKind::Class, 10),
                ],
                &[],
            )
            .unwrap();

        let matches = graph.find_symbols(&project.id, "get_*", None, 100).unwrap();
        assert_eq!(matches.len(), 2);

        let classes = graph
            .find_symbols(&project.id, "*", Some(SymbolKind::Class), 100)
            .unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "User");

        let limited = graph.find_symbols(&project.id, "*", None, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_find_references_reports_dangling_then_resolved() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        // foo.py calls bar() before bar.py is indexed.
        graph
            .replace_file(
                &project.id,
                &file_record("foo.py", "python", "v1"),
                &[sym("foo", SymbolKind::Function, 1)],
                &[edge(EdgeKind::References, "foo", "bar", 2)],
            )
            .unwrap();

        let refs = graph.find_references(&project.id, "bar").unwrap();
        assert_eq!(refs.references.len(), 1);
        assert_eq!(refs.references[0].from_symbol, "foo");
        assert!(!refs.resolved);

        // Indexing bar.py resolves it without touching foo.py.
        graph
            .replace_file(
                &project.id,
                &file_record("bar.py", "python", "v1"),
                &[sym("bar", SymbolKind::Function, 1)],
                &[],
            )
            .unwrap();

        let refs = graph.find_references(&project.id, "bar").unwrap();
        assert!(refs.resolved);
        assert_eq!(refs.references.len(), 1);
    }

    #[test]
    fn test_get_dependencies_follows_imports_transitively() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        graph
            .replace_file(
                &project.id,
                &file_record("main.py", "python", "v1"),
                &[],
                &[edge(EdgeKind::Imports, "", "utils", 1)],
            )
            .unwrap();
        graph
            .replace_file(
                &project.id,
                &file_record("utils.py", "python", "v1"),
                &[],
                &[edge(EdgeKind::Imports, "", "json", 1)],
            )
            .unwrap();

        let deps = graph.get_dependencies(&project.id, "main.py", None).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].module, "utils");
        assert_eq!(deps[0].file.as_deref(), Some("utils.py"));
        assert_eq!(deps[0].depth, 1);
        // json is external: reported but unresolved.
        assert_eq!(deps[1].module, "json");
        assert_eq!(deps[1].file, None);
        assert_eq!(deps[1].depth, 2);
    }

    #[test]
    fn test_get_dependencies_terminates_on_cycles() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        graph
            .replace_file(
                &project.id,
                &file_record("a.py", "python", "v1"),
                &[],
                &[edge(EdgeKind::Imports, "", "b", 1)],
            )
            .unwrap();
        graph
            .replace_file(
                &project.id,
                &file_record("b.py", "python", "v1"),
                &[],
                &[edge(EdgeKind::Imports, "", "a", 1)],
            )
            .unwrap();

        let deps = graph.get_dependencies(&project.id, "a.py", None).unwrap();
        let modules: Vec<&str> = deps.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(modules, vec!["b", "a"]);
    }

    #[test]
    fn test_get_dependencies_respects_depth_bound() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        for (file, target) in [("a.py", "b"), ("b.py", "c"), ("c.py", "d"), ("d.py", "e")] {
            graph
                .replace_file(
                    &project.id,
                    &file_record(file, "python", "v1"),
                    &[],
                    &[edge(EdgeKind::Imports, "", target, 1)],
                )
                .unwrap();
        }

        let deps = graph.get_dependencies(&project.id, "a.py", Some(2)).unwrap();
        let modules: Vec<&str> = deps.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(modules, vec!["b", "c"]);
    }

    #[test]
    fn test_get_dependencies_unbounded_without_depth() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        // m0 -> m1 -> ... -> m12, longer than any implicit cutoff.
        for i in 0..12 {
            graph
                .replace_file(
                    &project.id,
                    &file_record(&format!("m{}.py", i), "python", "v1"),
                    &[],
                    &[edge(EdgeKind::Imports, "", &format!("m{}", i + 1), 1)],
                )
                .unwrap();
        }

        let deps = graph.get_dependencies(&project.id, "m0.py", None).unwrap();
        assert_eq!(deps.len(), 12);
        assert_eq!(deps.last().unwrap().module, "m12");
        assert_eq!(deps.last().unwrap().depth, 12);
    }

    #[test]
    fn test_stats_counts_and_languages() {
        let dir = tempdir().unwrap();
        let graph = graph(&dir);
        let project = graph.create_project(&ctx(), "demo", "/work").unwrap();

        graph
            .replace_file(
                &project.id,
                &file_record("a.py", "python", "v1"),
                &[sym("f", SymbolKind::Function, 1)],
                &[edge(EdgeKind::Imports, "", "os", 1)],
            )
            .unwrap();
        graph
            .replace_file(
                &project.id,
                &file_record("b.js", "javascript", "v1"),
                &[sym("g", SymbolKind::Function, 1)],
                &[],
            )
            .unwrap();

        let stats = graph.stats(&project.id).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.symbols, 2);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.files_by_language["python"], 1);
        assert_eq!(stats.files_by_language["javascript"], 1);
        assert!(stats.last_indexed.is_some());
    }
}
