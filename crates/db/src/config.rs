//! Database configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RETRO_SHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `RETRO_SHOP_DB_MAX_CONNECTIONS` - Pool size (default: 10, minimum 1)
//! - `RETRO_SHOP_DB_ACQUIRE_TIMEOUT_SECS` - Seconds to wait for a connection (default: 10)

use secrecy::SecretString;
use thiserror::Error;

const DATABASE_URL_VAR: &str = "RETRO_SHOP_DATABASE_URL";
const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";
const MAX_CONNECTIONS_VAR: &str = "RETRO_SHOP_DB_MAX_CONNECTIONS";
const ACQUIRE_TIMEOUT_VAR: &str = "RETRO_SHOP_DB_ACQUIRE_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Maximum pool size
    pub max_connections: u32,
    /// Seconds to wait when acquiring a pooled connection
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// setting cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`DatabaseConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_VAR)
            .or_else(|| lookup(FALLBACK_DATABASE_URL_VAR))
            .filter(|url| !url.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_VAR.to_string()))?;

        let max_connections =
            parse_or_default(&lookup, MAX_CONNECTIONS_VAR, DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                MAX_CONNECTIONS_VAR.to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let acquire_timeout_secs =
            parse_or_default(&lookup, ACQUIRE_TIMEOUT_VAR, DEFAULT_ACQUIRE_TIMEOUT_SECS)?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout_secs,
        })
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            DatabaseConfig::from_lookup(lookup_from(&[(DATABASE_URL_VAR, "postgres://x/db")]))
                .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://x/db");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 10);
    }

    #[test]
    fn test_falls_back_to_database_url() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[(
            FALLBACK_DATABASE_URL_VAR,
            "postgres://fallback/db",
        )]))
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
    }

    #[test]
    fn test_primary_url_wins() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "postgres://primary/db"),
            (FALLBACK_DATABASE_URL_VAR, "postgres://fallback/db"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary/db");
    }

    #[test]
    fn test_missing_url() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == DATABASE_URL_VAR));
    }

    #[test]
    fn test_blank_url_is_missing() {
        let err =
            DatabaseConfig::from_lookup(lookup_from(&[(DATABASE_URL_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_overrides() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "postgres://x/db"),
            (MAX_CONNECTIONS_VAR, "4"),
            (ACQUIRE_TIMEOUT_VAR, " 30 "),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_number() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "postgres://x/db"),
            (MAX_CONNECTIONS_VAR, "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == MAX_CONNECTIONS_VAR));
    }

    #[test]
    fn test_zero_connections_rejected() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_VAR, "postgres://x/db"),
            (MAX_CONNECTIONS_VAR, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }
}
