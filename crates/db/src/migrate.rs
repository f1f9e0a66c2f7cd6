//! Schema migrations.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! retro-cli migrate run
//!
//! # Show which migrations are applied
//! retro-cli migrate status
//! ```
//!
//! # Migration Files
//!
//! ```text
//! crates/db/migrations/
//! ├── 20250101000001_create_updated_at_function.sql
//! ├── 20250101000002_create_users.sql
//! ├── 20250101000003_create_products.sql
//! ├── 20250101000004_create_carts.sql
//! ├── 20250101000005_create_cart_items.sql
//! ├── 20250101000006_create_orders.sql
//! └── 20250101000007_create_order_items.sql
//! ```
//!
//! File order is foreign-key order: users and products before carts and
//! orders, carts before cart items, orders before order items. Applied
//! versions are recorded in `_sqlx_migrations`, so re-running is a no-op.

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use thiserror::Error;

/// Every migration in `crates/db/migrations`, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

/// Applied state of one embedded migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Apply all pending migrations.
///
/// Runs on a single connection with `statement_timeout` and `lock_timeout`
/// disabled, then restores the session defaults before the connection goes
/// back to the pool.
///
/// # Errors
///
/// Returns `MigrationError` if a connection cannot be acquired, a migration
/// fails, or a previously applied migration's checksum changed.
pub async fn run(pool: &PgPool) -> Result<(), MigrationError> {
    let mut conn = pool.acquire().await?;

    sqlx::query("SET statement_timeout = 0")
        .execute(&mut *conn)
        .await?;
    sqlx::query("SET lock_timeout = 0").execute(&mut *conn).await?;

    tracing::info!(embedded = MIGRATOR.iter().count(), "Running migrations...");
    let result = MIGRATOR.run(&mut *conn).await;

    let reset = reset_timeouts(&mut conn).await;

    result?;
    reset?;

    tracing::info!("Migrations complete!");
    Ok(())
}

async fn reset_timeouts(conn: &mut sqlx::PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("RESET statement_timeout")
        .execute(&mut *conn)
        .await?;
    sqlx::query("RESET lock_timeout").execute(&mut *conn).await?;
    Ok(())
}

/// Report every embedded migration and whether it has been applied.
///
/// # Errors
///
/// Returns `MigrationError::Database` if the bookkeeping table cannot be read.
pub async fn status(pool: &PgPool) -> Result<Vec<MigrationStatus>, MigrationError> {
    let (table_exists,): (bool,) =
        sqlx::query_as("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let applied: HashSet<i64> = if table_exists {
        sqlx::query_as::<_, (i64,)>("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|(version,)| version)
            .collect()
    } else {
        HashSet::new()
    };

    Ok(embedded_with(&applied))
}

/// Pair each embedded migration with its applied flag.
fn embedded_with(applied: &HashSet<i64>) -> Vec<MigrationStatus> {
    MIGRATOR
        .iter()
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_in_dependency_order() {
        let descriptions: Vec<String> = MIGRATOR
            .iter()
            .map(|m| m.description.to_string())
            .collect();
        assert_eq!(
            descriptions,
            [
                "create updated at function",
                "create users",
                "create products",
                "create carts",
                "create cart items",
                "create orders",
                "create order items",
            ]
        );
    }

    #[test]
    fn test_versions_strictly_increase() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_migrations_never_drop_tables() {
        for m in MIGRATOR.iter() {
            assert!(
                !m.sql.to_uppercase().contains("DROP TABLE"),
                "{} drops a table",
                m.description
            );
        }
    }

    #[test]
    fn test_cart_uniqueness_is_deferrable() {
        let carts = MIGRATOR
            .iter()
            .find(|m| m.description == "create carts")
            .map(|m| m.sql.to_string())
            .unwrap_or_default();
        assert!(carts.contains("UNIQUE (user_id, status)"));
        assert!(carts.contains("DEFERRABLE"));
    }

    #[test]
    fn test_embedded_with_marks_applied() {
        let first = MIGRATOR.iter().next().map(|m| m.version).unwrap_or_default();
        let statuses = embedded_with(&HashSet::from([first]));
        assert_eq!(statuses.len(), 7);
        assert!(statuses[0].applied);
        assert!(statuses[1..].iter().all(|s| !s.applied));
    }
}
