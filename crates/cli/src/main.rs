//! TeamMate CLI, the main entry point.
//!
//! Commands:
//! - `serve`   Start the WebSocket and HTTP gateway
//! - `doctor`  Check configuration and backend reachability
//! - `schema`  Create, reset or compare the vector-store schema

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "teammate",
    about = "TeamMate: real-time chat gateway with retrieval-backed replies",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Diagnose configuration and backends
    Doctor,

    /// Manage the vector-store schema
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
}

#[derive(Subcommand)]
enum SchemaAction {
    /// Create every class in the schema file
    Create,
    /// Delete all classes, then create them again
    Reset,
    /// Report whether the live schema matches the file
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment from .env, if present; real variables win.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(port, host).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Schema { action } => match action {
            SchemaAction::Create => commands::schema::create().await?,
            SchemaAction::Reset => commands::schema::reset().await?,
            SchemaAction::Status => commands::schema::status().await?,
        },
    }

    Ok(())
}
