//! CLI entry point for the caseboard investigation board.

use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use caseboard_core::{BoardConfig, BoardEdge, BoardNode};
use caseboard_graph::{BoardClient, Neo4jEngine};

#[derive(Parser)]
#[command(name = "caseboard")]
#[command(about = "Versioned investigation board over a graph store")]
struct Cli {
    /// Config file prefix (default: caseboard).
    #[arg(short, long, default_value = "caseboard")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the full board graph as JSON.
    Board {
        /// Board version; defaults to the active version.
        #[arg(long)]
        version: Option<String>,
    },
    /// Print the nodes of a board version.
    Nodes {
        #[arg(long)]
        version: Option<String>,
    },
    /// Print the edges of a board version.
    Edges {
        #[arg(long)]
        version: Option<String>,
    },
    /// List all board versions.
    Versions,
    /// Print the active version.
    Active,
    /// Set the active version.
    SetActive { version: String },
    /// Create a new, empty board version.
    CreateVersion { version: String },
    /// Delete a board version with all its nodes and edges.
    DeleteVersion { version: String },
    /// Converge a board version to the graph in a JSON file
    /// ({"nodes": [...], "edges": [...]}).
    Sync {
        #[arg(long)]
        version: String,
        #[arg(long)]
        file: String,
    },
    /// Create the database, apply the schema, and create the
    /// investigation (requires debug_ops).
    Init,
    /// Delete the entire investigation (requires debug_ops).
    Destroy,
}

/// Desired-state file accepted by `sync`.
#[derive(Deserialize)]
struct GraphFile {
    #[serde(default)]
    nodes: Vec<BoardNode>,
    #[serde(default)]
    edges: Vec<BoardEdge>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = BoardConfig::load(&cli.config)?;

    let engine = Neo4jEngine::connect(&config.engine).await?;
    let mut client = BoardClient::new(Arc::new(engine), &config).await?;

    // Init runs before any version exists, so it must not require one.
    if matches!(&cli.command, Command::Init) {
        client.ensure_database_exists().await?;
        client.investigation_create().await?;
        println!("investigation '{}' created", client.investigation());
        return Ok(());
    }

    if let Err(e) = client.load_active_version().await {
        tracing::warn!("no active version loaded: {e}");
    }

    match cli.command {
        Command::Board { version } => {
            let graph = client.graph_by_version_get(version.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
        Command::Nodes { version } => {
            let graph = client.graph_by_version_get(version.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&graph.nodes)?);
        }
        Command::Edges { version } => {
            let graph = client.graph_by_version_get(version.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&graph.edges)?);
        }
        Command::Versions => {
            let versions = client.get_versions().await?;
            println!("{}", serde_json::to_string_pretty(&versions)?);
        }
        Command::Active => match client.active_version() {
            Some(v) => println!("{v}"),
            None => anyhow::bail!("no active version set"),
        },
        Command::SetActive { version } => {
            client.set_active_version(&version).await?;
            println!("active version set to {version}");
        }
        Command::CreateVersion { version } => {
            client.graph_by_version_create(&version).await?;
            println!("version {version} created");
        }
        Command::DeleteVersion { version } => {
            client.graph_by_version_delete(Some(&version)).await?;
            println!("version {version} deleted");
        }
        Command::Sync { version, file } => {
            let text = fs::read_to_string(&file)?;
            let graph: GraphFile = serde_json::from_str(&text)?;
            let report = client
                .update_graph(&version, &graph.nodes, &graph.edges)
                .await?;
            if report.is_noop() {
                println!("already converged, no changes");
            } else {
                println!("applied {} step(s):", report.len());
                for step in &report.steps {
                    println!("  {step:?}");
                }
            }
        }
        Command::Destroy => {
            client.investigation_delete().await?;
            println!("investigation '{}' deleted", client.investigation());
        }
        Command::Init => unreachable!(),
    }

    Ok(())
}
