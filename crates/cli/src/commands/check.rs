//! Integrity check command.

use tracing::{error, info};

use retro_shop_db::integrity;

/// Run every integrity rule and fail if any row breaks one.
///
/// # Errors
///
/// Returns an error if the database is unreachable or violations are found.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let violations = integrity::check(&pool).await?;
    pool.close().await;

    if violations.is_empty() {
        info!("{} rules checked, no violations", integrity::RULES.len());
        return Ok(());
    }

    for v in &violations {
        error!(rule = v.rule, "{}", v.detail);
    }
    Err(format!("{} integrity violations found", violations.len()).into())
}
