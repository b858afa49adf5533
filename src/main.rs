use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use calendar_mcp::CalendarError;
use calendar_mcp::config::Config;
use calendar_mcp::dispatch::{AuthContext, Dispatcher, ReqwestTransport};
use calendar_mcp::mcp::{McpHandler, McpServer, McpServerConfig, McpToolDefinition};
use calendar_mcp::tools::ToolCatalog;

mod cli;

use cli::Cli;
use cli::commands::Commands;

// stdout carries the MCP stream, so logs go to a file.
fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("calendar-mcp")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("calendar-mcp.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let level = if verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_catalog(config: &Config) -> Result<ToolCatalog> {
    match &config.catalog_path {
        Some(path) => {
            info!("Loading tool catalog from {}", path.display());
            ToolCatalog::from_file(path).context(format!("Failed to load catalog from {}", path.display()))
        }
        None => ToolCatalog::builtin().context("Failed to load built-in catalog"),
    }
}

fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let transport = ReqwestTransport::new(config.api.timeout()).context("Failed to create HTTP client")?;
    let auth = AuthContext::new(config.api.api_key.clone(), config.api.bearer_token.clone());
    if auth.is_empty() {
        log::warn!("No API key or bearer token configured; requests will be unauthenticated");
    }
    Ok(Dispatcher::new(Arc::new(transport), config.api.base_url.clone(), auth))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
    }

    let catalog = build_catalog(config)?;

    match &cli.command {
        None | Some(Commands::Serve) => handle_serve_command(catalog, config).await,
        Some(Commands::List { filter }) => handle_list_command(&catalog, filter.as_deref()),
        Some(Commands::Describe { tool }) => handle_describe_command(&catalog, tool),
        Some(Commands::Call { tool, args }) => handle_call_command(&catalog, tool, args, config).await,
    }
}

async fn handle_serve_command(catalog: ToolCatalog, config: &Config) -> Result<()> {
    info!("Serving {} tools against {}", catalog.len(), config.api.base_url);

    let dispatcher = build_dispatcher(config)?;
    let handler = McpHandler::new(Arc::new(catalog), dispatcher);
    let server_config = McpServerConfig::default().with_max_concurrent_calls(config.server.max_concurrent_calls);
    let server = McpServer::new(handler, server_config);

    server
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await
        .context("MCP server failed")?;

    info!("Input closed, shutting down");
    Ok(())
}

fn handle_list_command(catalog: &ToolCatalog, filter: Option<&str>) -> Result<()> {
    info!("Listing tools - filter: {:?}", filter);
    let tools = catalog
        .all()
        .filter(|tool| filter.is_none_or(|f| tool.name.contains(f)));

    for tool in tools {
        println!(
            "{} {} {}",
            tool.name.green(),
            tool.method.to_string().cyan(),
            tool.path.dimmed()
        );
    }
    Ok(())
}

fn handle_describe_command(catalog: &ToolCatalog, name: &str) -> Result<()> {
    let tool = catalog
        .get(name)
        .ok_or_else(|| CalendarError::UnknownTool(name.to_string()))?;
    let definition = serde_json::to_string_pretty(&McpToolDefinition::from(tool))?;
    println!("{}", definition);
    Ok(())
}

async fn handle_call_command(catalog: &ToolCatalog, name: &str, args: &str, config: &Config) -> Result<()> {
    info!("Calling tool: {}", name);
    let tool = catalog
        .get(name)
        .ok_or_else(|| CalendarError::UnknownTool(name.to_string()))?;
    let args: serde_json::Value = serde_json::from_str(args).context("Failed to parse --args as JSON")?;

    let dispatcher = build_dispatcher(config)?;
    let result = dispatcher.invoke(tool, &args).await;

    if result.is_error {
        bail!("{} {}", "Tool error:".red(), result.content);
    }
    println!("{}", result.content);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config, cli.is_verbose()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
