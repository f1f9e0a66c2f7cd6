//! Seed the database with fixture data.
//!
//! Without `--file` the fixture set embedded from `crates/db/seeds/fixtures.yaml`
//! is loaded. Fixtures are parsed and validated before connecting, so a bad
//! file never opens a database connection.

use std::path::Path;

use tracing::{error, info, warn};

use retro_shop_db::seed::{self, FixtureSet};

/// Validate and load fixtures.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or any insert fails.
pub async fn fixtures(file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let fixtures = match file {
        Some(path) => {
            if !path.exists() {
                return Err(format!("File not found: {}", path.display()).into());
            }
            info!(path = %path.display(), "Loading fixtures from file");
            FixtureSet::from_file(path).await?
        }
        None => {
            info!("Loading embedded fixtures");
            FixtureSet::embedded()?
        }
    };

    let errors = seed::validate_fixtures(&fixtures);
    if !errors.is_empty() {
        error!("Fixture validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!("Fixtures validated successfully");

    let pool = super::connect().await?;
    let report = seed::seed(&pool, &fixtures).await?;
    pool.close().await;

    if let Some(email) = &report.skipped_existing {
        warn!("Seed skipped: user {email} already exists");
        return Ok(());
    }

    info!("Seeding complete!");
    info!("  Users inserted: {}", report.users);
    info!("  Products inserted: {}", report.products);
    info!("  Carts inserted: {} ({} items)", report.carts, report.cart_items);
    info!("  Orders inserted: {} ({} items)", report.orders, report.order_items);

    Ok(())
}
