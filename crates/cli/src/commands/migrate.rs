//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! retro-cli migrate run
//!
//! # Show applied and pending migrations
//! retro-cli migrate status
//! ```
//!
//! # Environment Variables
//!
//! - `RETRO_SHOP_DATABASE_URL` - `PostgreSQL` connection string (or `DATABASE_URL`)
//!
//! Migration files live in `crates/db/migrations/` and are embedded in the
//! binary at build time.

use tracing::info;

use retro_shop_db::migrate;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    migrate::run(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Report each embedded migration and whether it has been applied.
///
/// # Errors
///
/// Returns an error if configuration is missing or the database is unreachable.
pub async fn status() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let statuses = migrate::status(&pool).await?;
    pool.close().await;

    let pending = statuses.iter().filter(|s| !s.applied).count();

    info!("Migration Status");
    info!("================");
    for s in &statuses {
        let state = if s.applied { "applied" } else { "pending" };
        info!("  {} {:<8} {}", s.version, state, s.description);
    }
    info!("{} applied, {pending} pending", statuses.len() - pending);

    Ok(())
}
