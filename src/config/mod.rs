//! Configuration module for CEMS.
//!
//! Configuration is loaded from `CEMS_*` environment variables, organized by
//! area: Web listeners, the poll loop (App) and Sensor wiring. Command-line
//! flags parsed by the binary are layered on top with [`Config::apply`].

mod app_config;
mod sensor_config;
mod web_config;

pub use app_config::AppEnvConfig;
pub use sensor_config::{SensorBackend, SensorEnvConfig};
pub use web_config::WebEnvConfig;

use anyhow::{Context, Result};
use serde_json::json;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main agent configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub web: WebEnvConfig,
    pub app: AppEnvConfig,
    pub sensor: SensorEnvConfig,
}

/// Values supplied on the command line; `None` keeps the environment value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_host: Option<String>,
    pub debug_host: Option<String>,
    pub metrics_host: Option<String>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub shutdown_timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
    pub backend: Option<SensorBackend>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let web = WebEnvConfig::from_env().context("Failed to load web config")?;
        let app = AppEnvConfig::from_env().context("Failed to load app config")?;
        let sensor = SensorEnvConfig::from_env().context("Failed to load sensor config")?;

        Ok(Self { web, app, sensor })
    }

    /// Layers command-line values over the environment and re-checks the
    /// result, so a flag cannot bypass validation done at load time.
    pub fn apply(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(host) = overrides.api_host {
            self.web.api_host = host;
        }
        if let Some(host) = overrides.debug_host {
            self.web.debug_host = host;
        }
        if let Some(host) = overrides.metrics_host {
            self.web.metrics_host = host;
        }
        if let Some(timeout) = overrides.read_timeout {
            self.web.read_timeout = timeout;
        }
        if let Some(timeout) = overrides.write_timeout {
            self.web.write_timeout = timeout;
        }
        if let Some(timeout) = overrides.shutdown_timeout {
            self.web.shutdown_timeout = timeout;
        }
        if let Some(interval) = overrides.poll_interval {
            self.app.poll_interval = interval;
        }
        if let Some(backend) = overrides.backend {
            self.sensor.backend = backend;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app.poll_interval.is_zero() {
            anyhow::bail!("Poll interval must be greater than zero");
        }
        if self.sensor.read_retries == 0 {
            anyhow::bail!("Sensor read retries must be at least 1");
        }
        Ok(())
    }

    /// Flat view of the effective configuration, used for the startup log
    /// and `/debug/vars`.
    pub fn describe(&self) -> serde_json::Value {
        json!({
            "web": {
                "api_host": self.web.api_host,
                "debug_host": self.web.debug_host,
                "metrics_host": self.web.metrics_host,
                "read_timeout": format!("{:?}", self.web.read_timeout),
                "write_timeout": format!("{:?}", self.web.write_timeout),
                "shutdown_timeout": format!("{:?}", self.web.shutdown_timeout),
            },
            "app": {
                "poll_interval": format!("{:?}", self.app.poll_interval),
            },
            "sensor": {
                "backend": format!("{:?}", self.sensor.backend).to_lowercase(),
                "dht_pin": self.sensor.dht_pin,
                "trigger_pin": self.sensor.trigger_pin,
                "echo_pin": self.sensor.echo_pin,
                "read_retries": self.sensor.read_retries,
                "temperature_unit": self.sensor.temperature_unit.to_string(),
                "echo_timeout": format!("{:?}", self.sensor.echo_timeout),
                "water_level_enabled": self.sensor.water_level_enabled,
            },
        })
    }
}

/// Parses `250ms`, `5s`, `2m`, `1h` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    if digits.is_empty() {
        anyhow::bail!("Invalid duration '{}': missing number", value);
    }
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("Invalid duration '{}'", value))?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "" | "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(amount.saturating_mul(3600))),
        other => anyhow::bail!(
            "Invalid duration '{}': unknown unit '{}' (use ms, s, m or h)",
            value,
            other
        ),
    }
}

fn env_duration(key: &str, default: Duration) -> Result<Duration> {
    match env::var(key) {
        Ok(value) => parse_duration(&value).with_context(|| format!("Failed to parse {}", key)),
        Err(_) => Ok(default),
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={}", key, value)),
        Err(_) => Ok(default),
    }
}
