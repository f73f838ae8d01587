// Incremental indexing: fingerprint, parse, extract, persist

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::extract::extract;
use super::graph::CodeGraph;
use super::parser;
use super::{FileRecord, IndexFailure, IndexOutcome, IndexSummary, Project};
use crate::config::Config;
use crate::error::{Error, Result};

/// Coordinates parsing and graph persistence for one project.
pub struct Indexer {
    graph: Arc<CodeGraph>,
    project: Project,
    config: Config,
}

impl Indexer {
    pub fn new(graph: Arc<CodeGraph>, project: Project, config: Config) -> Self {
        Self {
            graph,
            project,
            config,
        }
    }

    /// Index one file, stored under its path relative to `root`. An
    /// unchanged fingerprint short-circuits before any parsing happens.
    pub fn index_file(&self, root: &Path, path: &Path) -> Result<IndexOutcome> {
        let rel = path.strip_prefix(root).unwrap_or(path);
        let rel_str = rel.to_string_lossy().to_string();

        let spec = parser::detect(path)?;

        let source = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

        let fingerprint = blake3::hash(source.as_bytes()).to_hex().to_string();
        if self.graph.file_fingerprint(&self.project.id, &rel_str)? == Some(fingerprint.clone()) {
            debug!("Unchanged: {}", rel_str);
            return Ok(IndexOutcome::Unchanged);
        }

        let tree = parser::parse(&source, spec, &rel_str)?;
        let (symbols, edges) = extract(&tree, &source, spec);

        let record = FileRecord {
            path: rel_str.clone(),
            language: spec.tag.to_string(),
            fingerprint,
            line_count: source.lines().count(),
            symbol_count: symbols.len(),
            edge_count: edges.len(),
            indexed_at: Utc::now(),
        };
        self.graph
            .replace_file(&self.project.id, &record, &symbols, &edges)?;

        debug!(
            "Indexed {} ({} symbols, {} edges)",
            rel_str,
            symbols.len(),
            edges.len()
        );
        Ok(IndexOutcome::Indexed {
            symbols: symbols.len(),
            edges: edges.len(),
        })
    }

    /// Index every recognized file under `root`. Per-file failures are
    /// recorded in the summary without failing the run; the cancellation
    /// flag stops dispatch of further files while in-flight ones finish
    /// and stay persisted.
    pub async fn index_directory(
        self: Arc<Self>,
        root: &Path,
        cancel: Arc<AtomicBool>,
    ) -> Result<IndexSummary> {
        let files = self.collect_files(root)?;
        info!(
            "Indexing {} files under {} for project {}",
            files.len(),
            root.display(),
            self.project.name
        );

        let root = root.to_path_buf();
        let concurrency = self.config.indexing.concurrency.max(1);

        let outcomes: Vec<Option<(String, Result<IndexOutcome>)>> = stream::iter(files)
            .map(|path| {
                let indexer = self.clone();
                let root = root.clone();
                let cancel = cancel.clone();
                async move {
                    if cancel.load(Ordering::Relaxed) {
                        return None;
                    }
                    let rel = path
                        .strip_prefix(&root)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .to_string();
                    let result = tokio::task::spawn_blocking(move || {
                        indexer.index_file(&root, &path)
                    })
                    .await
                    .unwrap_or_else(|e| Err(Error::Storage(format!("index task panicked: {}", e))));
                    Some((rel, result))
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut summary = IndexSummary::default();
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                (_, Ok(IndexOutcome::Indexed { symbols, edges })) => {
                    summary.files_indexed += 1;
                    summary.symbols_found += symbols;
                    summary.edges_found += edges;
                }
                (_, Ok(IndexOutcome::Unchanged)) => summary.files_unchanged += 1,
                (path, Err(e)) => {
                    warn!("Failed to index {}: {}", path, e);
                    summary.files_failed += 1;
                    summary.failures.push(IndexFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Index run: {} indexed, {} unchanged, {} failed",
            summary.files_indexed, summary.files_unchanged, summary.files_failed
        );
        Ok(summary)
    }

    fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let enabled = self.config.get_enabled_languages();
        let mut files = Vec::new();

        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let rel = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            if !self.config.should_index_file(&rel) {
                continue;
            }
            let Ok(spec) = parser::detect(path) else {
                continue;
            };
            if enabled.iter().any(|lang| lang == spec.tag) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::intel::graph::CODE_INTEL_FLAG;
    use crate::portal::registry::PortalRegistry;
    use tempfile::tempdir;

    fn setup(storage: &Path) -> (Arc<CodeGraph>, Project) {
        let registry = PortalRegistry::new(storage);
        let portal = registry.resolve("test-org", "code").unwrap();
        let graph = Arc::new(CodeGraph::open(portal).unwrap());
        let ctx = AuthContext::new("dev-1", "test-org").with_flag(CODE_INTEL_FLAG);
        let project = graph.create_project(&ctx, "demo", "/work").unwrap();
        (graph, project)
    }

    fn indexer(graph: Arc<CodeGraph>, project: Project) -> Arc<Indexer> {
        Arc::new(Indexer::new(graph, project, Config::default()))
    }

    #[test]
    fn test_index_file_then_unchanged_then_reindex() {
        let storage = tempdir().unwrap();
        let src = tempdir().unwrap();
        let (graph, project) = setup(storage.path());
        let indexer = indexer(graph.clone(), project.clone());

        let file = src.path().join("app.py");
        std::fs::write(&file, "def greet(name):\n    return name\n").unwrap();

        let outcome = indexer.index_file(src.path(), &file).unwrap();
        assert_eq!(outcome, IndexOutcome::Indexed { symbols: 1, edges: 0 });

        // Same content: fingerprint short-circuit.
        let outcome = indexer.index_file(src.path(), &file).unwrap();
        assert_eq!(outcome, IndexOutcome::Unchanged);

        // Changed content: full replace.
        std::fs::write(&file, "def greet(name):\n    return name\n\ndef bye():\n    pass\n")
            .unwrap();
        let outcome = indexer.index_file(src.path(), &file).unwrap();
        assert_eq!(outcome, IndexOutcome::Indexed { symbols: 2, edges: 0 });

        let matches = graph.find_symbols(&project.id, "*", None, 100).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_index_file_errors() {
        let storage = tempdir().unwrap();
        let src = tempdir().unwrap();
        let (graph, project) = setup(storage.path());
        let indexer = indexer(graph, project);

        let err = indexer
            .index_file(src.path(), &src.path().join("ghost.py"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));

        let txt = src.path().join("notes.txt");
        std::fs::write(&txt, "hello").unwrap();
        let err = indexer.index_file(src.path(), &txt).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage(_)));
    }

    #[tokio::test]
    async fn test_index_directory_isolates_failures() {
        let storage = tempdir().unwrap();
        let src = tempdir().unwrap();
        let (graph, project) = setup(storage.path());
        let indexer = indexer(graph.clone(), project.clone());

        std::fs::write(src.path().join("main.py"), "import utils\n\ndef run():\n    pass\n")
            .unwrap();
        std::fs::write(src.path().join("utils.py"), "def helper():\n    pass\n").unwrap();
        std::fs::write(src.path().join("broken.py"), "x = (\n").unwrap();
        std::fs::write(src.path().join("notes.txt"), "not code").unwrap();

        let summary = indexer
            .clone()
            .index_directory(src.path(), Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();

        assert_eq!(summary.files_indexed, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, "broken.py");
        assert!(summary.symbols_found >= 2);

        // The good files are queryable despite the failure.
        let deps = graph.get_dependencies(&project.id, "main.py", None).unwrap();
        assert_eq!(deps[0].file.as_deref(), Some("utils.py"));
    }

    #[tokio::test]
    async fn test_index_directory_second_run_is_unchanged() {
        let storage = tempdir().unwrap();
        let src = tempdir().unwrap();
        let (graph, project) = setup(storage.path());
        let indexer = indexer(graph, project);

        std::fs::write(src.path().join("a.py"), "def f():\n    pass\n").unwrap();

        let first = indexer
            .clone()
            .index_directory(src.path(), Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();
        assert_eq!(first.files_indexed, 1);

        let second = indexer
            .clone()
            .index_directory(src.path(), Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();
        assert_eq!(second.files_indexed, 0);
        assert_eq!(second.files_unchanged, 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_dispatch() {
        let storage = tempdir().unwrap();
        let src = tempdir().unwrap();
        let (graph, project) = setup(storage.path());
        let indexer = indexer(graph, project);

        std::fs::write(src.path().join("a.py"), "def f():\n    pass\n").unwrap();
        std::fs::write(src.path().join("b.py"), "def g():\n    pass\n").unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let summary = indexer.clone().index_directory(src.path(), cancel).await.unwrap();
        assert_eq!(summary.files_indexed, 0);
        assert_eq!(summary.files_failed, 0);
    }
}
