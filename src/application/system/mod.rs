pub mod shutdown_service;

use crate::application::poller::SensorPoller;
use crate::config::{Config, SensorBackend};
use crate::domain::errors::AgentError;
use crate::domain::ports::{DistanceSensor, EnvironmentSensor};
use crate::infrastructure::gpio::{GpioDistanceSensor, GpioEnvironmentSensor};
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::simulated::{SimulatedDistanceSensor, SimulatedEnvironmentSensor};
use crate::interfaces::http::{self, api, debug, scrape};
use anyhow::Result;
use shutdown_service::ShutdownSignal;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The assembled agent: sensors, metrics and configuration.
pub struct Application {
    pub config: Config,
    pub metrics: Metrics,
    pub environment: Arc<dyn EnvironmentSensor>,
    pub distance: Option<Arc<dyn DistanceSensor>>,
}

impl Application {
    pub fn build(config: Config) -> Result<Self> {
        info!(
            "Building CEMS agent (backend: {:?})...",
            config.sensor.backend
        );

        let sensor = &config.sensor;
        let (environment, distance): (Arc<dyn EnvironmentSensor>, Arc<dyn DistanceSensor>) =
            match sensor.backend {
                SensorBackend::Gpio => {
                    info!(
                        "Using GPIO sensors (DHT22: GPIO{}, HC-SR04: trigger GPIO{} / echo GPIO{})",
                        sensor.dht_pin, sensor.trigger_pin, sensor.echo_pin
                    );
                    (
                        Arc::new(GpioEnvironmentSensor::new(
                            sensor.dht_pin,
                            sensor.read_retries,
                            sensor.temperature_unit,
                        )),
                        Arc::new(GpioDistanceSensor::new(
                            sensor.trigger_pin,
                            sensor.echo_pin,
                            sensor.echo_timeout,
                        )),
                    )
                }
                SensorBackend::Simulated => {
                    info!("Using simulated sensors");
                    (
                        Arc::new(SimulatedEnvironmentSensor::new(sensor.temperature_unit)),
                        Arc::new(SimulatedDistanceSensor::new()),
                    )
                }
            };

        let distance = sensor.water_level_enabled.then_some(distance);
        Self::with_sensors(config, environment, distance)
    }

    pub fn with_sensors(
        config: Config,
        environment: Arc<dyn EnvironmentSensor>,
        distance: Option<Arc<dyn DistanceSensor>>,
    ) -> Result<Self> {
        Ok(Self {
            config,
            metrics: Metrics::new()?,
            environment,
            distance,
        })
    }

    /// Binds every listener. Any bind failure is fatal.
    pub async fn bind(self) -> Result<BoundApplication, AgentError> {
        let api = http::bind("API", &self.config.web.api_host).await?;
        let metrics = http::bind("Metrics", &self.config.web.metrics_host).await?;
        let debug = http::bind("Debug", &self.config.web.debug_host).await?;

        Ok(BoundApplication {
            app: self,
            api,
            metrics,
            debug,
        })
    }

    /// Runs until SIGINT/SIGTERM.
    pub async fn run(self) -> Result<(), AgentError> {
        let signal = ShutdownSignal::install()?;
        self.bind().await?.serve(signal.recv()).await
    }
}

pub struct BoundApplication {
    app: Application,
    api: TcpListener,
    metrics: TcpListener,
    debug: TcpListener,
}

impl BoundApplication {
    pub fn api_addr(&self) -> std::io::Result<SocketAddr> {
        self.api.local_addr()
    }

    pub fn metrics_addr(&self) -> std::io::Result<SocketAddr> {
        self.metrics.local_addr()
    }

    pub fn debug_addr(&self) -> std::io::Result<SocketAddr> {
        self.debug.local_addr()
    }

    pub fn metrics(&self) -> Metrics {
        self.app.metrics.clone()
    }

    /// Starts the poll loop and the listeners, then blocks on the API
    /// listener until `shutdown` resolves and in-flight requests drain.
    ///
    /// The poll loop and the metrics/debug listeners are aborted afterwards,
    /// not joined.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), AgentError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            app,
            api,
            metrics,
            debug: debug_listener,
        } = self;
        let web = &app.config.web;

        let poller = SensorPoller::new(
            app.environment.clone(),
            app.distance.clone(),
            app.metrics.clone(),
            app.config.app.poll_interval,
        );
        let poller_handle = tokio::spawn(poller.run());

        info!("main: Debug listening on {}", local(&debug_listener));
        let debug_state = Arc::new(debug::DebugState::new(
            app.metrics.clone(),
            app.config.describe(),
        ));
        let debug_handle = http::spawn_background("Debug", debug_listener, debug::router(debug_state));

        info!("main: Metrics listening on {}", local(&metrics));
        let metrics_handle =
            http::spawn_background("Metrics", metrics, scrape::router(app.metrics.clone()));

        info!("main: API listening on {}", local(&api));
        let api_router = api::router(
            api::ApiState {
                environment: app.environment.clone(),
                read_timeout: web.read_timeout,
            },
            web.write_timeout,
        );
        let result =
            http::serve_with_grace("API", api, api_router, shutdown, web.shutdown_timeout).await;

        poller_handle.abort();
        metrics_handle.abort();
        debug_handle.abort();

        result
    }
}

fn local(listener: &TcpListener) -> String {
    listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string())
}
