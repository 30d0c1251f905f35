//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// OCAPI Tools - commerce Data API endpoints as MCP tools
#[derive(Parser, Debug)]
#[command(name = "ocapi-tools")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "OCAPI_TOOLS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Endpoint catalog file (overrides the configured path)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "OCAPI_TOOLS_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "OCAPI_TOOLS_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve MCP over stdio (default)
    Serve,

    /// Inspect and invoke tools without an MCP client
    #[command(subcommand)]
    Tools(ToolsCommand),

    /// Endpoint catalog commands
    #[command(subcommand)]
    Catalog(CatalogCommand),
}

/// Tool subcommands
#[derive(Subcommand, Debug)]
pub enum ToolsCommand {
    /// List the tools the catalog defines
    List,

    /// Call a tool once and print the result
    Call {
        /// Tool name
        #[arg(required = true)]
        name: String,

        /// JSON arguments to pass to the tool
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

/// Catalog subcommands
#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Strictly validate a catalog file
    Validate {
        /// Path to catalog file (JSON or YAML)
        #[arg(required = true)]
        file: PathBuf,
    },
}
