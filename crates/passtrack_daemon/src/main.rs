//! Passtrack daemon - runs the synchronization engine against the remote
//! catalog/profile API.

mod config;
mod shutdown;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::EnvFilter;

use passtrack::api::{ApiClient, ApiCredentials, ApiRateLimiter, DEFAULT_RPS};
use passtrack::migration::Migrator;
use passtrack::sync::{Lifecycle, SyncContext, spawn_engine};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "passtrackd")]
#[command(version)]
#[command(about = "Mirrors a remote beatmap catalog and tracks user completions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the synchronization engine until interrupted
    Run,
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Show migration status
    Status,
    /// Drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Run => run(&config).await,
        Commands::Migrate { action } => migrate(&config, action).await,
    }
}

async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = passtrack::connect_and_migrate(&config.database_url()).await?;

    let (client_id, client_secret) = config.api_credentials()?;
    let credentials = ApiCredentials {
        client_id,
        client_secret,
    };
    let api = match &config.api.base_url {
        Some(base_url) => ApiClient::with_base_url(credentials, base_url),
        None => ApiClient::new(credentials),
    };
    let limiter = ApiRateLimiter::new(config.api.requests_per_second.unwrap_or(DEFAULT_RPS));

    let ctx = Arc::new(
        SyncContext::new(db, Arc::new(api), limiter)
            .with_force_full_discovery(config.discovery.force_full),
    );

    let lifecycle = Lifecycle::new();
    shutdown::setup_shutdown_handler(lifecycle.clone());

    tracing::info!("starting synchronization engine");
    let loops = spawn_engine(ctx, &lifecycle);
    for handle in loops {
        handle.await?;
    }
    lifecycle.stop();
    tracing::info!("synchronization engine stopped");
    Ok(())
}

async fn migrate(config: &Config, action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = passtrack::connect(&config.database_url()).await?;
    match action {
        MigrateAction::Up => {
            Migrator::up(&db, None).await?;
            println!("migrations applied");
        }
        MigrateAction::Status => {
            Migrator::status(&db).await?;
        }
        MigrateAction::Fresh => {
            Migrator::fresh(&db).await?;
            println!("database recreated");
        }
    }
    Ok(())
}
