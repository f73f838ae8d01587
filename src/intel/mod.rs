// Code intelligence: parsing, extraction, graph persistence, indexing

pub mod extract;
pub mod graph;
pub mod indexer;
pub mod parser;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Kinds of declarations the extractor recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
    Constant,
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Module => "module",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "function" => Ok(SymbolKind::Function),
            "class" => Ok(SymbolKind::Class),
            "method" => Ok(SymbolKind::Method),
            "variable" => Ok(SymbolKind::Variable),
            "constant" => Ok(SymbolKind::Constant),
            "module" => Ok(SymbolKind::Module),
            other => Err(Error::InvalidRecord(format!("unknown symbol kind '{}'", other))),
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of edges stored in the graph. Dependency answers are derived from
/// `imports` at query time rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Imports,
    Exports,
    References,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Imports => "imports",
            EdgeKind::Exports => "exports",
            EdgeKind::References => "references",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "imports" => Ok(EdgeKind::Imports),
            "exports" => Ok(EdgeKind::Exports),
            "references" => Ok(EdgeKind::References),
            other => Err(Error::InvalidRecord(format!("unknown edge kind '{}'", other))),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declaration found in a file.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SymbolRecord {
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: usize,
    pub end_line: usize,
    /// Literal parameter text, best-effort
    pub signature: Option<String>,
    /// Enclosing declaration, e.g. the class of a method
    pub parent: Option<String>,
}

/// One edge found in a file. `source` is the innermost enclosing symbol
/// for references, or empty for module-level imports/exports. Targets are
/// names; they may dangle until the target file is indexed.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EdgeRecord {
    pub kind: EdgeKind,
    pub source: String,
    pub target: String,
    pub line: usize,
}

/// Per-file bookkeeping row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileRecord {
    pub path: String,
    pub language: String,
    pub fingerprint: String,
    pub line_count: usize,
    pub symbol_count: usize,
    pub edge_count: usize,
    pub indexed_at: DateTime<Utc>,
}

/// A project row in the graph store.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub root: String,
    pub organization_id: String,
    pub created_at: DateTime<Utc>,
}

/// A symbol search hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SymbolMatch {
    pub file: String,
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: Option<String>,
    pub parent: Option<String>,
}

/// One call site referencing a name.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Reference {
    pub file: String,
    pub from_symbol: String,
    pub line: usize,
}

/// All references to a name, plus whether it currently resolves to an
/// indexed definition.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReferenceSet {
    pub target: String,
    pub resolved: bool,
    pub references: Vec<Reference>,
}

/// One hop of a dependency traversal. `file` is set when the module name
/// resolved to an indexed file; otherwise the dependency is external.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Dependency {
    pub module: String,
    pub file: Option<String>,
    pub depth: usize,
}

/// Aggregate counts for one project.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ProjectStats {
    pub files: usize,
    pub symbols: usize,
    pub edges: usize,
    pub files_by_language: BTreeMap<String, usize>,
    pub last_indexed: Option<DateTime<Utc>>,
}

/// Outcome of indexing a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome {
    Indexed { symbols: usize, edges: usize },
    Unchanged,
}

/// Summary of a directory run. Per-file failures land in `failures`
/// without failing the run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexSummary {
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_failed: usize,
    pub symbols_found: usize,
    pub edges_found: usize,
    pub failures: Vec<IndexFailure>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexFailure {
    pub path: String,
    pub error: String,
}
