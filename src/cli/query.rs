use anyhow::Result;

use crate::intel::SymbolKind;

use super::{open_graph, open_registry};

/// Find symbols by name pattern (`*` wildcards).
pub async fn find_symbols(
    pattern: String,
    kind: Option<String>,
    limit: usize,
    format: String,
    project: Option<String>,
    project_dir: String,
) -> Result<()> {
    let (config, registry) = open_registry(&project_dir);
    let (graph, project) = open_graph(&registry, &config, &project_dir, project)?;

    let kind = kind.as_deref().map(SymbolKind::parse).transpose()?;
    let matches = graph.find_symbols(&project.id, &pattern, kind, limit)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No symbols matching '{}'", pattern);
        return Ok(());
    }
    println!("Found {} symbols:", matches.len());
    for m in &matches {
        let parent = m
            .parent
            .as_deref()
            .map(|p| format!(" (in {})", p))
            .unwrap_or_default();
        println!("  {} {}{}  {}:{}", m.kind, m.name, parent, m.file, m.start_line);
    }
    Ok(())
}

/// Show every call site referencing a name.
pub async fn find_references(
    name: String,
    format: String,
    project: Option<String>,
    project_dir: String,
) -> Result<()> {
    let (config, registry) = open_registry(&project_dir);
    let (graph, project) = open_graph(&registry, &config, &project_dir, project)?;

    let refs = graph.find_references(&project.id, &name)?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&refs)?);
        return Ok(());
    }

    if refs.references.is_empty() {
        println!("No references to '{}'", name);
        return Ok(());
    }
    println!(
        "Found {} references to '{}'{}:",
        refs.references.len(),
        name,
        if refs.resolved { "" } else { " (no indexed definition)" }
    );
    for r in &refs.references {
        let from = if r.from_symbol.is_empty() {
            "<module>".to_string()
        } else {
            r.from_symbol.clone()
        };
        println!("  {} from {}  {}:{}", name, from, r.file, r.line);
    }
    Ok(())
}

/// Show the transitive imports of a file.
pub async fn show_dependencies(
    path: String,
    depth: Option<usize>,
    format: String,
    project: Option<String>,
    project_dir: String,
) -> Result<()> {
    let (config, registry) = open_registry(&project_dir);
    let (graph, project) = open_graph(&registry, &config, &project_dir, project)?;

    let deps = graph.get_dependencies(&project.id, &path, depth.or(config.graph.max_depth))?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&deps)?);
        return Ok(());
    }

    if deps.is_empty() {
        println!("No dependencies recorded for '{}'", path);
        return Ok(());
    }
    println!("Dependencies of {}:", path);
    for dep in &deps {
        let resolved = dep
            .file
            .as_deref()
            .map(|f| format!(" -> {}", f))
            .unwrap_or_else(|| " (external)".to_string());
        println!("  {}{}{}", "  ".repeat(dep.depth - 1), dep.module, resolved);
    }
    Ok(())
}
