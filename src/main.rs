// keyapi - Read-only JSON API for taxonomic identification keys
use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use keyapi::{init_logging, ApiConfig, AppState, KeyStore};

/// Command-line and environment configuration
#[derive(Debug, Parser)]
#[command(
    name = "keyapi",
    version,
    about = "Read-only JSON API for taxonomic identification keys"
)]
struct Args {
    /// Port the HTTP listener binds to
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Path prefix the API routes are mounted under
    #[arg(long, env = "API_URL_BASE", default_value = "/")]
    base_path: String,

    /// Public base URL used when synthesizing media links
    #[arg(long, env = "API_URL", default_value = "http://localhost:3000")]
    public_url: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Maximum connections held by the pool
    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 5)]
    pool_size: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    let config = Arc::new(ApiConfig {
        port: args.port,
        base_path: args.base_path,
        public_url: args.public_url,
        database_url: args.database_url,
        max_connections: args.pool_size,
    });

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("PostgreSQL connection failed")?;

    // Verify the connection before binding the listener
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("PostgreSQL ping failed")?;

    let store = KeyStore::new(pool);
    let state = AppState::new(store, config.clone());

    info!(
        port = config.port,
        base_path = %config.base_path,
        "Server starting"
    );

    keyapi::start_server(state).await
}
