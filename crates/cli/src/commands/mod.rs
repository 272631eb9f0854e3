//! CLI command implementations.

pub mod cart;
pub mod migrate;
pub mod profile;

use serde::Serialize;
use thiserror::Error;

use ecofinds_core::{AccountId, IdError};
use ecofinds_storefront::config::{ConfigError, StorefrontConfig};
use ecofinds_storefront::error::CartError;
use ecofinds_storefront::services::SessionError;
use ecofinds_storefront::state::{AppState, StateError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    State(#[from] StateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("invalid account id: {0}")]
    InvalidAccount(#[from] IdError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Connect to the configured backends.
///
/// Remote accounts need a database; without one, profiles would only live for
/// the duration of the command.
async fn connect(config: StorefrontConfig, needs_database: bool) -> Result<AppState, CliError> {
    if needs_database {
        config.require_database_url()?;
    }
    Ok(AppState::connect(config).await?)
}

fn parse_account(raw: &str) -> Result<AccountId, CliError> {
    Ok(AccountId::parse(raw)?)
}

/// Print `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}
