//! Database layer for the Retro Shop schema.
//!
//! # Tables
//!
//! - `users` - Identity, placeholder credentials, role and activity flag
//! - `products` - Catalog entries priced in integer cents, full-text indexed
//! - `carts` - At most one cart per (user, status)
//! - `cart_items` - Cart lines with a unit price snapshot
//! - `orders` - Orders with subtotal/tax/shipping/total in cents
//! - `order_items` - Order lines with unit price and line total
//!
//! # Migrations
//!
//! Migrations are stored in `crates/db/migrations/`, embedded in [`MIGRATOR`]
//! and run via:
//! ```bash
//! cargo run -p retro-shop-cli -- migrate run
//! ```
//!
//! They are forward-only. Nothing drops tables; a schema change is a new file.
//!
//! # Modules
//!
//! - [`users`], [`products`], [`carts`], [`orders`] - Repository functions
//! - [`seed`] - Fixture loading
//! - [`integrity`] - Live-data invariant checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod carts;
pub mod config;
pub mod error;
pub mod integrity;
pub mod migrate;
pub mod models;
pub mod orders;
pub mod products;
pub mod seed;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use config::{ConfigError, DatabaseConfig};
pub use error::RepositoryError;
pub use migrate::{MIGRATOR, MigrationError};
pub use seed::{FixtureSet, SeedError, SeedReport};

/// Create a `PostgreSQL` connection pool from configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.max_connections.min(2))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(config.database_url.expose_secret())
        .await
}

/// Turn off `statement_timeout` and `lock_timeout` for the current transaction.
///
/// Schema application and seeding may wait on locks held by other sessions;
/// neither should be cut short by server defaults.
pub(crate) async fn disable_timeouts_local(
    conn: &mut sqlx::PgConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("SET LOCAL statement_timeout = 0")
        .execute(&mut *conn)
        .await?;
    sqlx::query("SET LOCAL lock_timeout = 0")
        .execute(&mut *conn)
        .await?;
    Ok(())
}
