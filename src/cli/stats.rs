use anyhow::Result;

use super::{open_graph, open_registry};

/// Show storage-wide and per-project statistics.
pub async fn show_stats(verbose: bool, project: Option<String>, project_dir: String) -> Result<()> {
    let (config, registry) = open_registry(&project_dir);

    println!("memportal statistics v{}", env!("CARGO_PKG_VERSION"));

    let portals = registry.list_portals()?;
    println!("\nPortals: {}", portals.len());
    for portal in &portals {
        println!(
            "  {}  {} tables, {:.1} KB",
            portal.uri(),
            portal.table_count,
            portal.size_bytes as f64 / 1024.0
        );
    }

    let (graph, project) = open_graph(&registry, &config, &project_dir, project)?;
    let stats = graph.stats(&project.id)?;

    println!("\nProject '{}':", project.name);
    println!("  Files:   {}", stats.files);
    println!("  Symbols: {}", stats.symbols);
    println!("  Edges:   {}", stats.edges);
    if let Some(last) = stats.last_indexed {
        println!("  Last indexed: {}", last.to_rfc3339());
    }

    if verbose && !stats.files_by_language.is_empty() {
        println!("  Files by language:");
        for (language, count) in &stats.files_by_language {
            println!("    {}: {}", language, count);
        }
    }

    Ok(())
}
