use crate::domain::errors::SensorError;
use crate::domain::reading::EnvironmentReading;
use async_trait::async_trait;

/// Temperature/humidity probe.
///
/// Implementations run their own fixed retry count; callers decide how
/// to degrade when the returned error reaches them.
#[async_trait]
pub trait EnvironmentSensor: Send + Sync {
    async fn read_environment(&self) -> Result<EnvironmentReading, SensorError>;
}

/// Ultrasonic water-level probe. Returns the distance to the surface in cm.
#[async_trait]
pub trait DistanceSensor: Send + Sync {
    async fn read_distance(&self) -> Result<f64, SensorError>;
}
