//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ECOFINDS_DATABASE_URL` - `PostgreSQL` connection string for remote
//!   profiles (falls back to `DATABASE_URL`; without either, profiles are kept
//!   in memory)
//! - `ECOFINDS_LOCAL_STORE_DIR` - Directory of the local fallback store
//!   (default: `.ecofinds`)
//! - `ECOFINDS_LOCK_IDLE_SECS` - Seconds before an unused per-account lock is
//!   dropped (default: 300)
//! - `ECOFINDS_MAX_LOCKS` - Maximum number of per-account locks kept
//!   (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
///
/// `SecretString` keeps the database URL out of `Debug` output.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Directory holding the local fallback slots
    pub local_store_dir: PathBuf,
    /// Per-account lock settings for the cart engine
    pub locks: LockSettings,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Sizing of the per-account write lock cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSettings {
    /// How long an unused lock is kept.
    pub idle: Duration,
    /// Maximum number of locks kept at once.
    pub max_entries: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(300),
            max_entries: 10_000,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ECOFINDS_DATABASE_URL");
        let local_store_dir =
            PathBuf::from(get_env_or_default("ECOFINDS_LOCAL_STORE_DIR", ".ecofinds"));
        let idle_secs = parse_env_or_default::<u64>("ECOFINDS_LOCK_IDLE_SECS", 300)?;
        let max_entries = parse_env_or_default::<u64>("ECOFINDS_MAX_LOCKS", 10_000)?;
        if max_entries == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ECOFINDS_MAX_LOCKS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            local_store_dir,
            locks: LockSettings {
                idle: Duration::from_secs(idle_secs),
                max_entries,
            },
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// The database URL, required by commands that need remote profiles.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no URL is configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("ECOFINDS_DATABASE_URL".to_string()))
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            local_store_dir: PathBuf::from(".ecofinds"),
            locks: LockSettings::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_parse_value_valid() {
        assert_eq!(parse_value::<u64>("TEST_VAR", " 42 ").unwrap(), 42);
    }

    #[test]
    fn test_parse_value_invalid() {
        let err = parse_value::<u64>("TEST_VAR", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "TEST_VAR"));
    }

    #[test]
    fn test_default_lock_settings() {
        let locks = LockSettings::default();
        assert_eq!(locks.idle, Duration::from_secs(300));
        assert_eq!(locks.max_entries, 10_000);
    }

    #[test]
    fn test_require_database_url() {
        let mut config = StorefrontConfig::default();
        assert!(matches!(
            config.require_database_url(),
            Err(ConfigError::MissingEnvVar(_))
        ));

        config.database_url = Some(SecretString::from("postgres://localhost/ecofinds"));
        assert_eq!(
            config.require_database_url().unwrap().expose_secret(),
            "postgres://localhost/ecofinds"
        );
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = StorefrontConfig {
            database_url: Some(SecretString::from("postgres://user:hunter2@db/ecofinds")),
            ..StorefrontConfig::default()
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains(".ecofinds"));
        assert!(!debug_output.contains("hunter2"));
    }
}
