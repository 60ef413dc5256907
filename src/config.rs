//! Configuration loader for the `farmiq-reports` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Keeping every `env::var` call here means the rest
//! of the crate only ever sees a typed [`Config`].
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional string variable; blank counts as unset.
fn optional_env(var_name: &str) -> Option<String> {
    env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Upstream farm API base URL.
    pub source_api_url: String,

    /// Bearer token sent to the upstream API, if any.
    pub source_api_token: Option<String>,

    /// Per-request timeout for upstream calls, in seconds.
    pub source_timeout_secs: u32,

    /// Port the report service listens on.
    pub port: u16,

    /// JSON file with label translations.
    pub labels_path: Option<String>,

    /// Brand line printed on the full report cover.
    pub brand: String,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `SOURCE_API_URL` – upstream farm API base URL
///
/// Optional:
/// - `SOURCE_API_TOKEN` – bearer token for the upstream API
/// - `SOURCE_TIMEOUT_SECS` – upstream request timeout (default: 10)
/// - `REPORTS_PORT` – listen port (default: 8080)
/// - `REPORT_LABELS_PATH` – label translation file
/// - `REPORT_BRAND` – cover brand line (default: `FarmIQ`)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let source_api_url = require_env!("SOURCE_API_URL");
    let source_timeout_secs = parse_env_u32!("SOURCE_TIMEOUT_SECS", 10);
    let port = parse_env_u32!("REPORTS_PORT", 8080);

    if source_timeout_secs == 0 {
        return Err(anyhow!("Invalid SOURCE_TIMEOUT_SECS: must be at least 1"));
    }
    let port = u16::try_from(port).map_err(|_| anyhow!("Invalid REPORTS_PORT: {}", port))?;

    Ok(Config {
        source_api_url,
        source_api_token: optional_env("SOURCE_API_TOKEN"),
        source_timeout_secs,
        port,
        labels_path: optional_env("REPORT_LABELS_PATH"),
        brand: optional_env("REPORT_BRAND").unwrap_or_else(|| "FarmIQ".to_string()),
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// The API token is masked; everything else is shown as loaded.
    pub fn log_config(&self) {
        // ---
        let masked_token = match &self.source_api_token {
            Some(token) => {
                let shown = token.chars().count().saturating_sub(4).min(4);
                let tail: String = token.chars().skip(token.chars().count() - shown).collect();
                format!("****{}", tail)
            }
            None => "(none)".to_string(),
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  SOURCE_API_URL      : {}", self.source_api_url);
        tracing::info!("  SOURCE_API_TOKEN    : {}", masked_token);
        tracing::info!("  SOURCE_TIMEOUT_SECS : {}", self.source_timeout_secs);
        tracing::info!("  REPORTS_PORT        : {}", self.port);
        tracing::info!(
            "  REPORT_LABELS_PATH  : {}",
            self.labels_path.as_deref().unwrap_or("(none)")
        );
        tracing::info!("  REPORT_BRAND        : {}", self.brand);
    }
}
