//! Listener configuration parsing from environment variables.

use super::env_duration;
use anyhow::Result;
use std::env;
use std::time::Duration;

/// Web environment configuration
#[derive(Debug, Clone)]
pub struct WebEnvConfig {
    pub api_host: String,
    pub debug_host: String,
    pub metrics_host: String,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for WebEnvConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0:3500".to_string(),
            debug_host: "0.0.0.0:4000".to_string(),
            metrics_host: "0.0.0.0:2112".to_string(),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl WebEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            api_host: env::var("CEMS_WEB_API_HOST").unwrap_or(defaults.api_host),
            debug_host: env::var("CEMS_WEB_DEBUG_HOST").unwrap_or(defaults.debug_host),
            metrics_host: env::var("CEMS_WEB_METRICS_HOST").unwrap_or(defaults.metrics_host),
            read_timeout: env_duration("CEMS_WEB_READ_TIMEOUT", defaults.read_timeout)?,
            write_timeout: env_duration("CEMS_WEB_WRITE_TIMEOUT", defaults.write_timeout)?,
            shutdown_timeout: env_duration(
                "CEMS_WEB_SHUTDOWN_TIMEOUT",
                defaults.shutdown_timeout,
            )?,
        })
    }
}
