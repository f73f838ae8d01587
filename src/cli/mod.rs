// CLI command implementations

pub mod index;
pub mod languages;
pub mod portal;
pub mod query;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::auth::AuthContext;
use crate::config::Config;
use crate::intel::graph::{CodeGraph, CODE_INTEL_FLAG};
use crate::intel::Project;
use crate::portal::registry::PortalRegistry;
use crate::uri::MemoryUri;

/// Portal id the code graph lives in.
pub(crate) const GRAPH_PORTAL: &str = "code-intel";

/// Load config and open the registry rooted at the project's storage path.
pub(crate) fn open_registry(project_dir: &str) -> (Config, PortalRegistry) {
    let config = Config::from_project_dir(project_dir);
    let base = config.storage_path(Path::new(project_dir));
    let registry = PortalRegistry::new(base);
    (config, registry)
}

/// Local CLI invocations act as a fully-entitled developer of the
/// configured namespace; remote callers get their context from the auth
/// collaborator instead.
pub(crate) fn local_auth(config: &Config) -> AuthContext {
    AuthContext::new("local", &config.storage.default_namespace).with_flag(CODE_INTEL_FLAG)
}

/// Open the code graph for a project directory, creating the project row
/// on first use. The project name defaults to the directory name.
pub(crate) fn open_graph(
    registry: &PortalRegistry,
    config: &Config,
    project_dir: &str,
    name: Option<String>,
) -> Result<(Arc<CodeGraph>, Project)> {
    let name = name.unwrap_or_else(|| {
        Path::new(project_dir)
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "unnamed".to_string())
    });

    let portal = registry.resolve(&config.storage.default_namespace, GRAPH_PORTAL)?;
    let graph = Arc::new(CodeGraph::open(portal)?);

    let project = match graph.get_project(&name)? {
        Some(project) => project,
        None => graph.create_project(&local_auth(config), &name, project_dir)?,
    };
    Ok((graph, project))
}

/// Parse a `mem://` URI argument, accepting the bare `namespace/portal`
/// shorthand as well.
pub(crate) fn parse_uri(arg: &str) -> Result<MemoryUri> {
    let uri = if arg.starts_with("mem://") {
        MemoryUri::parse(arg)?
    } else {
        MemoryUri::parse(&format!("mem://{}", arg))?
    };
    Ok(uri)
}
