//! Prometheus metrics definitions for CEMS
//!
//! All metrics use the `cems_` prefix. Gauges and counters are atomic cells
//! owned by an explicit registry, so every component that publishes receives
//! a clone of [`Metrics`] instead of reaching for process-wide singletons.

use prometheus::{
    Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Content type of [`Metrics::render`] output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Prometheus metrics for the sensor agent
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Last temperature read by the poll loop
    pub temperature: GenericGauge<AtomicF64>,
    /// Last relative humidity read by the poll loop
    pub humidity: GenericGauge<AtomicF64>,
    /// Water level in cm (negated distance to the surface)
    pub water_level: GenericGauge<AtomicF64>,
    /// Completed poll iterations
    pub poll_operations_total: IntCounter,
    /// Failed sensor reads by sensor and error kind
    pub sensor_errors_total: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let temperature =
            Gauge::with_opts(Opts::new("cems_temperature", "The current temperature."))?;
        registry.register(Box::new(temperature.clone()))?;

        let humidity =
            Gauge::with_opts(Opts::new("cems_humidity", "The current humidity level."))?;
        registry.register(Box::new(humidity.clone()))?;

        let water_level = Gauge::with_opts(Opts::new(
            "cems_water_level",
            "The current water level measured in cm.",
        ))?;
        registry.register(Box::new(water_level.clone()))?;

        let poll_operations_total = IntCounter::with_opts(Opts::new(
            "cems_poll_operations_total",
            "Total number of completed sensor poll iterations.",
        ))?;
        registry.register(Box::new(poll_operations_total.clone()))?;

        let sensor_errors_total = IntCounterVec::new(
            Opts::new(
                "cems_sensor_errors_total",
                "Total failed sensor reads by sensor and error kind.",
            ),
            &["sensor", "kind"],
        )?;
        registry.register(Box::new(sensor_errors_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            temperature,
            humidity,
            water_level,
            poll_operations_total,
            sensor_errors_total,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn set_temperature(&self, value: f64) {
        self.temperature.set(value);
    }

    pub fn set_humidity(&self, value: f64) {
        self.humidity.set(value);
    }

    /// Publishes a distance-to-surface reading. The gauge is negated so it
    /// rises as the water rises.
    pub fn set_water_level(&self, distance_cm: f64) {
        self.water_level.set(-distance_cm);
    }

    pub fn increment_poll_count(&self) {
        self.poll_operations_total.inc();
    }

    pub fn poll_count(&self) -> u64 {
        self.poll_operations_total.get()
    }

    pub fn record_sensor_error(&self, sensor: &str, kind: &str) {
        self.sensor_errors_total
            .with_label_values(&[sensor, kind])
            .inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default Metrics")
    }
}
