//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! eco-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ECOFINDS_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations live in `crates/storefront/migrations/`.

use ecofinds_storefront::config::StorefrontConfig;
use ecofinds_storefront::db;

use super::CliError;

/// Run the storefront migrations.
///
/// # Errors
///
/// Returns `CliError::Config` if no database URL is configured, or a
/// database/migration error if connecting or migrating fails.
pub async fn run(config: &StorefrontConfig) -> Result<(), CliError> {
    let database_url = config.require_database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
