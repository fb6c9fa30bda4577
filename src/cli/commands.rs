use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(author, version, about = "Expose configured REST APIs as MCP tools", long_about = None)]
pub struct Cli {
    /// Path to the tool catalog file
    #[arg(short, long, default_value = "api-config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Speak the MCP line protocol on stdin/stdout
    Mcp,

    /// Run the REST control surface
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },

    /// Load and validate a catalog, printing the tool roster
    Check,
}
