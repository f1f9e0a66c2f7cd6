//! Subcommand implementations.

pub mod check;
pub mod migrate;
pub mod seed;

use retro_shop_db::DatabaseConfig;
use sqlx::PgPool;
use tracing::info;

/// Load configuration from the environment and open a pool.
async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;

    info!(
        max_connections = config.max_connections,
        "Connecting to database..."
    );
    let pool = retro_shop_db::create_pool(&config).await?;
    info!("Connected to database");

    Ok(pool)
}
