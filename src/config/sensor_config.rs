//! Sensor wiring configuration parsing from environment variables.
//!
//! Pin numbers are BCM GPIO numbers, not physical header positions.

use super::{env_duration, env_parse};
use crate::domain::reading::TemperatureUnit;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where readings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorBackend {
    Gpio,
    Simulated,
}

impl FromStr for SensorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gpio" => Ok(SensorBackend::Gpio),
            "simulated" | "mock" => Ok(SensorBackend::Simulated),
            _ => anyhow::bail!(
                "Invalid CEMS_SENSOR_BACKEND: {}. Must be 'gpio' or 'simulated'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SensorEnvConfig {
    pub backend: SensorBackend,
    pub dht_pin: u8,
    pub trigger_pin: u8,
    pub echo_pin: u8,
    pub read_retries: u32,
    pub temperature_unit: TemperatureUnit,
    pub echo_timeout: Duration,
    pub water_level_enabled: bool,
}

impl Default for SensorEnvConfig {
    fn default() -> Self {
        Self {
            backend: SensorBackend::Gpio,
            dht_pin: 4,
            trigger_pin: 23,
            echo_pin: 24,
            read_retries: 11,
            temperature_unit: TemperatureUnit::Fahrenheit,
            echo_timeout: Duration::from_millis(60),
            water_level_enabled: true,
        }
    }
}

impl SensorEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let backend = match env::var("CEMS_SENSOR_BACKEND") {
            Ok(value) => SensorBackend::from_str(&value)?,
            Err(_) => defaults.backend,
        };

        let temperature_unit = match env::var("CEMS_SENSOR_TEMPERATURE_UNIT") {
            Ok(value) => TemperatureUnit::from_str(&value)
                .context("Failed to parse CEMS_SENSOR_TEMPERATURE_UNIT")?,
            Err(_) => defaults.temperature_unit,
        };

        let read_retries = env_parse("CEMS_SENSOR_READ_RETRIES", defaults.read_retries)?;
        if read_retries == 0 {
            anyhow::bail!("CEMS_SENSOR_READ_RETRIES must be at least 1");
        }

        Ok(Self {
            backend,
            dht_pin: env_parse("CEMS_SENSOR_DHT_PIN", defaults.dht_pin)?,
            trigger_pin: env_parse("CEMS_SENSOR_TRIGGER_PIN", defaults.trigger_pin)?,
            echo_pin: env_parse("CEMS_SENSOR_ECHO_PIN", defaults.echo_pin)?,
            read_retries,
            temperature_unit,
            echo_timeout: env_duration("CEMS_SENSOR_ECHO_TIMEOUT", defaults.echo_timeout)?,
            water_level_enabled: env_parse(
                "CEMS_SENSOR_WATER_LEVEL_ENABLED",
                defaults.water_level_enabled,
            )?,
        })
    }
}
