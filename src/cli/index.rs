use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::intel::indexer::Indexer;

use super::{open_graph, open_registry};

/// Index a project directory into the code graph.
pub async fn index_project(
    project_dir: String,
    name: Option<String>,
    languages: Option<String>,
) -> Result<()> {
    info!("Indexing project: {}", project_dir);

    let (mut config, registry) = open_registry(&project_dir);
    if let Some(langs) = languages {
        config.languages.enabled = langs.split(',').map(|s| s.trim().to_string()).collect();
        config.validate()?;
    }

    println!("memportal indexer v{}", env!("CARGO_PKG_VERSION"));
    println!("Project: {}", project_dir);
    println!("Languages: {}", config.get_enabled_languages().join(", "));

    let (graph, project) = open_graph(&registry, &config, &project_dir, name)?;
    let indexer = Arc::new(Indexer::new(graph.clone(), project.clone(), config));

    // Ctrl-C flips the flag; in-flight files finish and stay persisted.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancellation requested, finishing in-flight files");
            cancel_on_signal.store(true, Ordering::Relaxed);
        }
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("Indexing {}...", project.name));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let summary = indexer
        .clone()
        .index_directory(Path::new(&project_dir), cancel.clone())
        .await?;
    spinner.finish_and_clear();

    println!("\nIndex summary for '{}':", project.name);
    println!("  Indexed:   {}", summary.files_indexed);
    println!("  Unchanged: {}", summary.files_unchanged);
    println!("  Failed:    {}", summary.files_failed);
    println!("  Symbols:   {}", summary.symbols_found);
    println!("  Edges:     {}", summary.edges_found);

    for failure in &summary.failures {
        println!("  ! {}: {}", failure.path, failure.error);
    }
    if cancel.load(Ordering::Relaxed) {
        println!("\nRun was cancelled; partial results are persisted.");
    }

    Ok(())
}
