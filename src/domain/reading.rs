use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Half the speed of sound, in cm per second.
pub const HALF_SPEED_OF_SOUND_CM_S: f64 = 17150.0;

/// Divisor applied to the raw echo distance before it is reported.
pub const DISTANCE_NORMALIZATION: f64 = 2.54;

/// Humidity and temperature from a single environment read.
///
/// This is also the body of the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EnvironmentReading {
    pub humidity: f64,
    pub temperature: f64,
}

/// One poll's worth of sensor data, written to the log sink as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub humidity: f64,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_level: Option<f64>,
}

impl Reading {
    pub fn new(environment: EnvironmentReading, water_level: Option<f64>) -> Self {
        Self {
            humidity: environment.humidity,
            temperature: environment.temperature,
            water_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => anyhow::bail!(
                "Invalid temperature unit: {}. Must be 'celsius' or 'fahrenheit'",
                s
            ),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => write!(f, "celsius"),
            TemperatureUnit::Fahrenheit => write!(f, "fahrenheit"),
        }
    }
}

/// Converts an ultrasonic echo round-trip time into the reported distance.
pub fn echo_distance(elapsed: Duration) -> f64 {
    let raw = elapsed.as_nanos() as f64 * HALF_SPEED_OF_SOUND_CM_S / 1e9;
    raw / DISTANCE_NORMALIZATION
}
