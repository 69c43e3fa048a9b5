//! Configuration management for the `CleanRoute` service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CleanRouteError;
use crate::store::DEFAULT_RADIUS_DEGREES;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `CleanRoute` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanRouteConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Directions provider settings
    #[serde(default)]
    pub directions: DirectionsConfig,
    /// Reading database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Pollution lookup settings
    #[serde(default)]
    pub lookup: LookupConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound on handling one request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Directions provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsConfig {
    /// OpenRouteService API key
    pub api_key: Option<String>,
    /// Base URL for the OpenRouteService API
    #[serde(default = "default_directions_base_url")]
    pub base_url: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_directions_timeout")]
    pub timeout_seconds: u64,
    /// Retries for transient failures
    #[serde(default = "default_directions_max_retries")]
    pub max_retries: u32,
}

/// Reading database settings
///
/// With a `url` the PostGIS store is used; otherwise readings come from
/// `seed_file` (or start empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string
    pub url: Option<String>,
    /// JSON seed file for the in-memory store
    pub seed_file: Option<String>,
    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Pollution lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Search radius in degrees
    #[serde(default = "default_radius_degrees")]
    pub radius_degrees: f64,
    /// Lookups in flight per route
    #[serde(default = "default_lookup_concurrency")]
    pub concurrency: usize,
    /// Per-lookup timeout in seconds
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    120
}

fn default_directions_base_url() -> String {
    "https://api.openrouteservice.org".to_string()
}

fn default_directions_timeout() -> u64 {
    15
}

fn default_directions_max_retries() -> u32 {
    2
}

fn default_max_connections() -> u32 {
    10
}

fn default_radius_degrees() -> f64 {
    DEFAULT_RADIUS_DEGREES
}

fn default_lookup_concurrency() -> usize {
    8
}

fn default_lookup_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_directions_base_url(),
            timeout_seconds: default_directions_timeout(),
            max_retries: default_directions_max_retries(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            seed_file: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            radius_degrees: default_radius_degrees(),
            concurrency: default_lookup_concurrency(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CleanRouteConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. CLEANROUTE_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("CLEANROUTE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CleanRouteConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_legacy_env(|name| std::env::var(name).ok());
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cleanroute").join("config.toml"))
    }

    /// Fill unset credentials from the variables older deployments export
    /// (`ORS_API_KEY`, `DATABASE_URL`)
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.directions.api_key.is_none() {
            self.directions.api_key = lookup("ORS_API_KEY").filter(|key| !key.is_empty());
        }
        if self.database.url.is_none() {
            self.database.url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.directions.base_url.is_empty() {
            self.directions.base_url = default_directions_base_url();
        }
        if self.directions.timeout_seconds == 0 {
            self.directions.timeout_seconds = default_directions_timeout();
        }
        if self.database.max_connections == 0 {
            self.database.max_connections = default_max_connections();
        }
        if self.lookup.radius_degrees <= 0.0 {
            self.lookup.radius_degrees = default_radius_degrees();
        }
        if self.lookup.concurrency == 0 {
            self.lookup.concurrency = default_lookup_concurrency();
        }
        if self.lookup.timeout_seconds == 0 {
            self.lookup.timeout_seconds = default_lookup_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.directions.api_key {
            if api_key.trim().is_empty() {
                return Err(CleanRouteError::config(
                    "Directions API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() > 200 {
                return Err(CleanRouteError::config(
                    "Directions API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(CleanRouteError::config("Server port cannot be 0").into());
        }

        if self.directions.timeout_seconds > 300 {
            return Err(CleanRouteError::config(
                "Directions timeout cannot exceed 300 seconds"
            ).into());
        }

        if self.directions.max_retries > 10 {
            return Err(CleanRouteError::config(
                "Directions max retries cannot exceed 10"
            ).into());
        }

        if !self.lookup.radius_degrees.is_finite() || self.lookup.radius_degrees > 1.0 {
            return Err(CleanRouteError::config(
                "Lookup radius must be a finite number of degrees no larger than 1.0"
            ).into());
        }

        if self.lookup.concurrency > 256 {
            return Err(CleanRouteError::config(
                "Lookup concurrency cannot exceed 256"
            ).into());
        }

        if self.lookup.timeout_seconds > 60 {
            return Err(CleanRouteError::config(
                "Lookup timeout cannot exceed 60 seconds"
            ).into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CleanRouteError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CleanRouteError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        if !self.directions.base_url.starts_with("http://") && !self.directions.base_url.starts_with("https://") {
            return Err(CleanRouteError::config(
                "Directions base URL must be a valid HTTP or HTTPS URL"
            ).into());
        }

        if let Some(url) = &self.database.url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(CleanRouteError::config(
                    "Database URL must be a postgres:// or postgresql:// connection string"
                ).into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CleanRouteConfig::default();
        assert_eq!(config.directions.base_url, "https://api.openrouteservice.org");
        assert_eq!(config.directions.timeout_seconds, 15);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.lookup.radius_degrees, 0.002);
        assert_eq!(config.logging.level, "info");
        assert!(config.directions.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = CleanRouteConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = CleanRouteConfig::default();
        config.logging.format = "xml".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log format"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = CleanRouteConfig::default();
        config.directions.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = CleanRouteConfig::default();
        config.lookup.radius_degrees = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = CleanRouteConfig::default();
        config.directions.api_key = Some("  ".to_string());
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_config_validation_database_url_scheme() {
        let mut config = CleanRouteConfig::default();
        config.database.url = Some("mysql://localhost/air".to_string());
        assert!(config.validate().is_err());

        config.database.url = Some("postgresql://localhost/air".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_defaults_repairs_zeroes() {
        let mut config = CleanRouteConfig::default();
        config.lookup.concurrency = 0;
        config.lookup.radius_degrees = 0.0;
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.lookup.concurrency, 8);
        assert_eq!(config.lookup.radius_degrees, 0.002);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_legacy_env_fills_only_unset_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ORS_API_KEY", "legacy-key"),
            ("DATABASE_URL", "postgres://legacy/db"),
        ]);
        let lookup = |name: &str| env.get(name).map(|value| (*value).to_string());

        let mut config = CleanRouteConfig::default();
        config.database.url = Some("postgres://configured/db".to_string());
        config.apply_legacy_env(lookup);

        assert_eq!(config.directions.api_key.as_deref(), Some("legacy-key"));
        assert_eq!(config.database.url.as_deref(), Some("postgres://configured/db"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8081\n\n[lookup]\nradius_degrees = 0.003\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = CleanRouteConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.lookup.radius_degrees, 0.003);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.directions.timeout_seconds, 15);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = CleanRouteConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("cleanroute"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
