use crate::domain::errors::SensorError;
use crate::domain::ports::{DistanceSensor, EnvironmentSensor};
use crate::domain::reading::{EnvironmentReading, Reading};
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// What happened during one poll iteration.
#[derive(Debug)]
pub struct PollReport {
    pub reading: Reading,
    /// The JSON record written to the log, if serialization succeeded
    pub record: Option<String>,
    pub environment_error: Option<SensorError>,
    pub distance_error: Option<SensorError>,
}

/// Background sampling loop.
///
/// Every failure inside an iteration is logged and counted. The loop keeps
/// its cadence no matter what the sensors do and only stops when its task
/// is dropped.
pub struct SensorPoller {
    environment: Arc<dyn EnvironmentSensor>,
    distance: Option<Arc<dyn DistanceSensor>>,
    metrics: Metrics,
    interval: Duration,
    last_water_level: Option<f64>,
}

impl SensorPoller {
    pub fn new(
        environment: Arc<dyn EnvironmentSensor>,
        distance: Option<Arc<dyn DistanceSensor>>,
        metrics: Metrics,
        interval: Duration,
    ) -> Self {
        Self {
            environment,
            distance,
            metrics,
            interval,
            last_water_level: None,
        }
    }

    pub async fn run(mut self) {
        info!(
            "SensorPoller: Starting (interval: {:?}, water level: {})",
            self.interval,
            if self.distance.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    pub async fn poll_once(&mut self) -> PollReport {
        // 1. Temperature / humidity
        let (environment, environment_error) = match self.environment.read_environment().await {
            Ok(reading) => {
                self.metrics.set_temperature(reading.temperature);
                self.metrics.set_humidity(reading.humidity);
                (reading, None)
            }
            Err(e) => {
                // Gauges keep the last good values; only the record carries zeros.
                warn!("SensorPoller: Environment read failed: {}", e);
                self.metrics.record_sensor_error("environment", e.kind());
                (EnvironmentReading::default(), Some(e))
            }
        };

        // 2. Water level, falling back to the last good value
        let mut distance_error = None;
        if let Some(sensor) = &self.distance {
            match sensor.read_distance().await {
                Ok(distance) => {
                    self.metrics.set_water_level(distance);
                    self.last_water_level = Some(distance);
                }
                Err(e) => {
                    warn!("SensorPoller: Distance read failed: {}", e);
                    self.metrics.record_sensor_error("distance", e.kind());
                    distance_error = Some(e);
                }
            }
        }

        self.metrics.increment_poll_count();

        // 3. Log record
        let reading = Reading::new(environment, self.last_water_level);
        let record = match serde_json::to_string(&reading) {
            Ok(json) => {
                info!("{}", json);
                Some(json)
            }
            Err(e) => {
                error!("SensorPoller: Failed to serialize reading: {}", e);
                None
            }
        };

        PollReport {
            reading,
            record,
            environment_error,
            distance_error,
        }
    }
}
