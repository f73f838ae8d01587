use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

mod auth;
mod cli;
mod config;
mod error;
mod intel;
mod portal;
mod uri;

#[derive(Parser)]
#[command(name = "memportal")]
#[command(version = "0.1.0")]
#[command(about = "Persistent memory portals and a code knowledge graph for AI agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory
    #[arg(short, long, global = true, default_value = ".")]
    project_dir: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write JSON records to a portal table
    Write {
        /// Target table URI, e.g. mem://team/scratch/users
        uri: String,

        /// A JSON object or array of objects
        data: String,
    },

    /// Run a read-only SELECT against a portal
    Query {
        /// Portal URI, e.g. mem://team/scratch
        uri: String,

        /// The SELECT statement
        sql: String,

        /// Output format: json, text
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a portal's tables and schemas
    Tables {
        /// Portal URI
        uri: String,
    },

    /// Read the resource surface of a URI (metadata or up to 1000 rows)
    Read {
        /// Portal or table URI, e.g. mem://team/scratch/users?limit=50
        uri: String,
    },

    /// Delete rows from a table
    Delete {
        /// Table URI
        uri: String,

        /// Equality conditions, field=value
        #[arg(short = 'w', long = "where", value_name = "FIELD=VALUE")]
        conditions: Vec<String>,

        /// Delete every row
        #[arg(long)]
        all: bool,
    },

    /// Drop one table from a portal
    DropTable {
        /// Table URI
        uri: String,
    },

    /// List all portals
    List,

    /// Delete a whole portal
    Drop {
        /// Portal URI
        uri: String,
    },

    /// Index a project's source files into the code graph
    Index {
        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Languages to index (comma-separated)
        #[arg(short, long)]
        languages: Option<String>,
    },

    /// Find symbols by name pattern
    Find {
        /// Name pattern, * wildcards allowed
        pattern: String,

        /// Restrict to a kind: function, class, method, variable, constant, module
        #[arg(short, long)]
        kind: Option<String>,

        /// Maximum results
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Output format: json, text
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Project name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Find call sites referencing a symbol name
    Refs {
        /// Symbol name
        symbol: String,

        /// Output format: json, text
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Project name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show the transitive imports of a file
    Deps {
        /// File path as indexed (relative to the project directory)
        path: String,

        /// Depth bound for the traversal
        #[arg(long)]
        depth: Option<usize>,

        /// Output format: json, text
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Project name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show storage and project statistics
    Stats {
        /// Verbose output
        #[arg(long)]
        verbose: bool,

        /// Project name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List supported languages
    Languages,
}

fn init_logging(debug: bool, verbose: bool) {
    let level = if debug {
        Level::DEBUG
    } else if verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug, cli.verbose);

    info!("memportal v0.1.0 starting...");

    let project_dir = cli.project_dir;
    match cli.command {
        Commands::Write { uri, data } => {
            cli::portal::write(uri, data, project_dir).await?;
        }

        Commands::Query { uri, sql, format } => {
            cli::portal::run_query(uri, sql, format, project_dir).await?;
        }

        Commands::Tables { uri } => {
            cli::portal::tables(uri, project_dir).await?;
        }

        Commands::Read { uri } => {
            cli::portal::read(uri, project_dir).await?;
        }

        Commands::Delete {
            uri,
            conditions,
            all,
        } => {
            cli::portal::delete(uri, conditions, all, project_dir).await?;
        }

        Commands::DropTable { uri } => {
            cli::portal::drop_table(uri, project_dir).await?;
        }

        Commands::List => {
            cli::portal::list(project_dir).await?;
        }

        Commands::Drop { uri } => {
            cli::portal::drop(uri, project_dir).await?;
        }

        Commands::Index { name, languages } => {
            cli::index::index_project(project_dir, name, languages).await?;
        }

        Commands::Find {
            pattern,
            kind,
            limit,
            format,
            name,
        } => {
            cli::query::find_symbols(pattern, kind, limit, format, name, project_dir).await?;
        }

        Commands::Refs {
            symbol,
            format,
            name,
        } => {
            cli::query::find_references(symbol, format, name, project_dir).await?;
        }

        Commands::Deps {
            path,
            depth,
            format,
            name,
        } => {
            cli::query::show_dependencies(path, depth, format, name, project_dir).await?;
        }

        Commands::Stats { verbose, name } => {
            cli::stats::show_stats(verbose, name, project_dir).await?;
        }

        Commands::Languages => {
            cli::languages::list_languages();
        }
    }

    Ok(())
}
