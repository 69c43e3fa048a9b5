//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{CleanRouteError, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. `format = "json"`
/// emits one JSON object per event; anything else is human-readable.
///
/// # Errors
///
/// Returns [`CleanRouteError::Config`] if the level is not a valid filter
/// directive or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, env_directives.as_deref())?;

    let result = if config.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .try_init()
    };

    result.map_err(|e| CleanRouteError::config(format!("tracing init failed: {e}")))
}

/// Filter from `RUST_LOG`-style directives if given and valid, else from
/// the configured level.
fn build_filter(config: &LoggingConfig, env_directives: Option<&str>) -> Result<EnvFilter> {
    if let Some(filter) = env_directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| CleanRouteError::config(format!("invalid log level '{}': {e}", config.level)))
}
