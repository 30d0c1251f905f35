//! OCAPI Tools - commerce Data API endpoints as MCP tools
//!
//! Serves MCP over stdio by default.

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};

use ocapi_tools::{
    App,
    catalog::validate_catalog,
    cli::{CatalogCommand, Cli, Command, ToolsCommand},
    config::Config,
    protocol::Content,
    server::{McpServer, serve_stdio},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Catalog validation needs no configuration
    if let Some(Command::Catalog(CatalogCommand::Validate { file })) = &cli.command {
        return match validate_catalog(file).await {
            Ok(count) => {
                println!("✅ {} is valid ({count} endpoints)", file.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Validation failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Tools(cmd)) => run_tools_command(cmd, &config).await,
        Some(Command::Serve | Command::Catalog(_)) | None => run_server(&config).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> ocapi_tools::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ref catalog) = cli.catalog {
        config.catalog.path.clone_from(catalog);
    }
    Ok(config)
}

/// Run tool subcommands
async fn run_tools_command(cmd: ToolsCommand, config: &Config) -> ExitCode {
    let app = App::build(config).await;

    match cmd {
        ToolsCommand::List => {
            let tools = app.router.tools();
            println!("Found {} tools:\n", tools.len());
            for tool in tools {
                println!(
                    "  {} - {}",
                    tool.name,
                    tool.description.unwrap_or_default()
                );
            }
            ExitCode::SUCCESS
        }

        ToolsCommand::Call { name, args } => {
            let params: serde_json::Value = match serde_json::from_str(&args) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("❌ Invalid JSON arguments: {e}");
                    return ExitCode::FAILURE;
                }
            };

            if !app.router.can_handle(&name) {
                eprintln!("❌ Unknown tool: {name}");
                return ExitCode::FAILURE;
            }

            let result = app.router.handle(&name, params, Instant::now()).await;
            app.router.dispose();

            for Content::Text { text } in &result.content {
                println!("{text}");
            }

            if result.is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

/// Run the stdio MCP server
async fn run_server(config: &Config) -> ExitCode {
    let app = App::build(config).await;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        tools = app.router.tools().len(),
        data_api = app.capabilities.data_api,
        "Starting OCAPI Tools"
    );

    let server = McpServer::new(app.router.clone(), app.capabilities);
    let outcome = serve_stdio(&server).await;
    app.router.dispose();

    if let Err(e) = outcome {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}
