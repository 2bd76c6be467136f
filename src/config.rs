// Runtime configuration read from the environment (and `.env` via dotenv)

use crate::availability::BookingPolicy;
use crate::images::DEFAULT_MAX_IMAGE_BYTES;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// Pending reservations also reduce catalog-wide availability
    pub aggregate_counts_pending: bool,
    /// Catalog-wide counts widen single-day reservations to their occupied window
    pub aggregate_uses_occupied_window: bool,
    pub max_image_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            aggregate_counts_pending: parse_or(&lookup, "AGGREGATE_COUNTS_PENDING", false)?,
            aggregate_uses_occupied_window: parse_or(
                &lookup,
                "AGGREGATE_USES_OCCUPIED_WINDOW",
                false,
            )?,
            max_image_bytes: parse_or(&lookup, "MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            aggregate_counts_pending: self.aggregate_counts_pending,
            aggregate_uses_occupied_window: self.aggregate_uses_occupied_window,
            ..Default::default()
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/dresses")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 5);
        assert!(!config.aggregate_counts_pending);
        assert_eq!(config.max_image_bytes, 2 * 1024 * 1024);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.booking_policy().aggregate_counts_pending);
        assert!(!config.booking_policy().aggregate_uses_occupied_window);
    }

    #[test]
    fn test_database_url_is_required() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/dresses"),
            ("PORT", "3000"),
            ("AGGREGATE_COUNTS_PENDING", "true"),
            ("AGGREGATE_USES_OCCUPIED_WINDOW", "true"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.booking_policy().aggregate_counts_pending);
        assert!(config.booking_policy().aggregate_uses_occupied_window);

        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/dresses"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }
}
