use crate::domain::errors::SensorError;
use crate::domain::ports::{DistanceSensor, EnvironmentSensor};
use crate::domain::reading::{EnvironmentReading, TemperatureUnit};
use async_trait::async_trait;
use rand::Rng;

/// Environment sensor that wanders around a base climate.
///
/// Used when the agent runs off-device (`CEMS_SENSOR_BACKEND=simulated`).
pub struct SimulatedEnvironmentSensor {
    base_celsius: f64,
    base_humidity: f64,
    unit: TemperatureUnit,
}

impl SimulatedEnvironmentSensor {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self {
            base_celsius: 22.0,
            base_humidity: 55.0,
            unit,
        }
    }
}

#[async_trait]
impl EnvironmentSensor for SimulatedEnvironmentSensor {
    async fn read_environment(&self) -> Result<EnvironmentReading, SensorError> {
        let mut rng = rand::rng();
        let celsius = self.base_celsius + rng.random_range(-1.5..=1.5);
        let humidity = (self.base_humidity + rng.random_range(-5.0..=5.0)).clamp(0.0, 100.0);

        // DHT22 resolution is 0.1
        Ok(EnvironmentReading {
            humidity: (humidity * 10.0).round() / 10.0,
            temperature: self.unit.from_celsius((celsius * 10.0).round() / 10.0),
        })
    }
}

/// Distance sensor hovering around a fixed water line.
pub struct SimulatedDistanceSensor {
    base_cm: f64,
}

impl SimulatedDistanceSensor {
    pub fn new() -> Self {
        Self { base_cm: 12.0 }
    }
}

impl Default for SimulatedDistanceSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DistanceSensor for SimulatedDistanceSensor {
    async fn read_distance(&self) -> Result<f64, SensorError> {
        let jitter = rand::rng().random_range(-0.25..=0.25);
        Ok(self.base_cm + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_environment_stays_plausible() {
        let sensor = SimulatedEnvironmentSensor::new(TemperatureUnit::Celsius);
        for _ in 0..50 {
            let reading = sensor.read_environment().await.unwrap();
            assert!((0.0..=100.0).contains(&reading.humidity));
            assert!((20.0..=24.0).contains(&reading.temperature));
        }
    }

    #[tokio::test]
    async fn test_simulated_environment_honours_unit() {
        let sensor = SimulatedEnvironmentSensor::new(TemperatureUnit::Fahrenheit);
        let reading = sensor.read_environment().await.unwrap();
        assert!(reading.temperature > 60.0);
    }

    #[tokio::test]
    async fn test_simulated_distance_is_positive() {
        let sensor = SimulatedDistanceSensor::new();
        let distance = sensor.read_distance().await.unwrap();
        assert!(distance > 11.0 && distance < 13.0);
    }
}
