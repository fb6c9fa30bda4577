use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use toolbridge::cli::{Cli, Commands};
use toolbridge::config::Catalog;
use toolbridge::core::invoker::Invoker;
use toolbridge::core::mcp::McpServer;
use toolbridge::rest::{self, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout is reserved for the MCP line protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Loaded once, immutable for the rest of the run.
    let catalog = Arc::new(
        Catalog::load(&cli.config)
            .with_context(|| format!("failed to load catalog from {}", cli.config.display()))?,
    );
    tracing::info!(
        "Catalog loaded: {} ({} tools)",
        catalog.server_name(),
        catalog.tools.len()
    );

    match cli.command {
        Commands::Mcp => {
            tracing::info!("Starting MCP server on stdin/stdout");
            let server = McpServer::new(Some(catalog), Invoker::new());
            server.run_stdio().await?;
        }
        Commands::Serve { addr } => {
            tracing::info!("Starting REST API server");
            let state = AppState {
                catalog,
                invoker: Invoker::new(),
            };
            rest::serve(state, addr).await?;
        }
        Commands::Check => handle_check(&catalog),
    }

    Ok(())
}

fn handle_check(catalog: &Catalog) {
    println!(
        "{} v{} ({} tools)",
        catalog.server_name(),
        catalog.server_version(),
        catalog.tools.len()
    );
    for tool in &catalog.tools {
        println!(
            "  {:<24} {:<6} {}",
            tool.name,
            tool.resolved_method(),
            tool.endpoint
        );
    }
}
