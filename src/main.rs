// src/main.rs
//! Pokédex API server entry point.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pokedex_api::api::server::PokedexServer;
use pokedex_api::config::AppConfig;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "pokedex_server")]
#[command(about = "Pokédex API Server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Config file (TOML). Falls back to CONFIG_PATH, then ./config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind the server to
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging()?;

    info!("Starting Pokédex API v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = AppConfig::load(&config_path).context("Failed to load configuration")?;

    if let Some(Commands::Serve { port: Some(port) }) = args.command {
        config.server.port = port;
    }

    if config.auth.uses_default_secret() {
        warn!("JWT_SECRET_KEY is not set: tokens are signed with the built-in development key. Set it before deploying.");
    }

    let server = PokedexServer::new(config)
        .await
        .context("Failed to initialize server")?;
    server.start().await?;

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
