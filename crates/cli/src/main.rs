//! Marketplace CLI - database maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations using DATABASE_URL
//! mp-cli migrate
//!
//! # Or point at a database explicitly
//! mp-cli migrate --database-url postgres://localhost/marketplace
//! ```
//!
//! # Commands
//!
//! - `migrate` - Apply the API's embedded schema migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// `PostgreSQL` connection string (defaults to `DATABASE_URL`)
        #[arg(long)]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { database_url } => commands::migrate::run(database_url).await?,
    }
    Ok(())
}
