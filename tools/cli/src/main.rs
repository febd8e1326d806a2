//! DriveAgent CLI - Google Drive functions for AI agents.
//!
//! Loads credentials from the environment (or a `.env` file), registers
//! the Drive functions and either serves them over MCP or invokes one
//! directly for testing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use driveagent_mcp::DriveAgentServer;
use driveagent_service::{AgentConfig, DriveService, ServiceBuilder, Session};

#[derive(Parser)]
#[command(name = "driveagent")]
#[command(about = "DriveAgent - Google Drive functions for AI agents")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Env file to load instead of searching for `.env`.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Drive functions as MCP tools over stdio.
    Serve,

    /// Print the registered functions and their schemas.
    Tools,

    /// Call a single function and print its result.
    Call {
        /// Function name (e.g. "searchFiles").
        function: String,

        /// Arguments as a JSON object.
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Show the loaded configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for MCP traffic and command output
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AgentConfig::load(cli.env_file.as_deref())
        .context("Please check your .env file")?;

    match cli.command {
        Commands::Serve => cmd_serve(config).await,
        Commands::Tools => cmd_tools(&config),
        Commands::Call { function, args } => cmd_call(&config, &function, &args).await,
        Commands::Config => cmd_config(&config),
    }
}

/// Register the Drive functions under the configured service name.
fn build_session(config: &AgentConfig) -> Result<Session> {
    let drive_service = DriveService::new(
        &config.client_id,
        config.client_secret.clone(),
        config.refresh_token.clone(),
    )
    .context("Failed to create Drive service")?;

    ServiceBuilder::new()
        .with_service_name(&config.service_name)
        .register_service(Arc::new(drive_service))
        .build()
        .context("Failed to register Drive functions")
}

/// Serve over MCP.
async fn cmd_serve(config: AgentConfig) -> Result<()> {
    let session = build_session(&config)?;

    info!(
        service = session.service_name(),
        gateway = %config.gateway_url,
        "Google Drive Knowledge Agent online"
    );
    info!("Ready to search, summarize, and organize your documents");

    DriveAgentServer::new(session)
        .serve_stdio()
        .await
        .context("MCP server failed")?;

    Ok(())
}

/// Print function specs.
fn cmd_tools(config: &AgentConfig) -> Result<()> {
    let session = build_session(config)?;
    let specs = session.registry().functions();

    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

/// Invoke one function.
async fn cmd_call(config: &AgentConfig, function: &str, args: &str) -> Result<()> {
    let args: serde_json::Value =
        serde_json::from_str(args).context("Arguments must be a JSON object")?;
    anyhow::ensure!(args.is_object(), "Arguments must be a JSON object");

    let session = build_session(config)?;
    let result = session
        .registry()
        .call(function, args)
        .await
        .with_context(|| format!("Failed to call '{}'", function))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Print redacted configuration.
fn cmd_config(config: &AgentConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
