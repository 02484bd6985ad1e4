//! CEMS agent - climate and water-level monitoring for a Raspberry Pi
//!
//! Polls a DHT22 and an HC-SR04 in the background, serves the live climate
//! reading on `GET /`, exposes Prometheus gauges on `GET /metrics` and build
//! variables on the debug listener.
//!
//! # Usage
//! ```sh
//! CEMS_APP_POLL_SECS=10s cems --backend simulated
//! ```
//!
//! Every option can be given as a `CEMS_*` environment variable (or in a
//! `.env` file). The flags below take precedence.

use anyhow::Result;
use cems::application::system::Application;
use cems::config::{Config, Overrides, SensorBackend, parse_duration};
use clap::Parser;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "cems", version, about = "Climate and water-level sensor agent")]
struct Cli {
    /// API listener address (CEMS_WEB_API_HOST)
    #[arg(long)]
    api_host: Option<String>,

    /// Debug listener address (CEMS_WEB_DEBUG_HOST)
    #[arg(long)]
    debug_host: Option<String>,

    /// Metrics listener address (CEMS_WEB_METRICS_HOST)
    #[arg(long)]
    metrics_host: Option<String>,

    /// Status read timeout, e.g. 5s (CEMS_WEB_READ_TIMEOUT)
    #[arg(long, value_parser = duration)]
    read_timeout: Option<Duration>,

    /// Status response timeout (CEMS_WEB_WRITE_TIMEOUT)
    #[arg(long, value_parser = duration)]
    write_timeout: Option<Duration>,

    /// Grace period for in-flight requests on shutdown (CEMS_WEB_SHUTDOWN_TIMEOUT)
    #[arg(long, value_parser = duration)]
    shutdown_timeout: Option<Duration>,

    /// Delay between sensor polls (CEMS_APP_POLL_SECS)
    #[arg(long, value_parser = duration)]
    poll_interval: Option<Duration>,

    /// Sensor backend: gpio or simulated (CEMS_SENSOR_BACKEND)
    #[arg(long)]
    backend: Option<SensorBackend>,
}

fn duration(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}

impl Cli {
    fn overrides(self) -> Overrides {
        Overrides {
            api_host: self.api_host,
            debug_host: self.debug_host,
            metrics_host: self.metrics_host,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            shutdown_timeout: self.shutdown_timeout,
            poll_interval: self.poll_interval,
            backend: self.backend,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // One timestamped line per event on stdout
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .with(stdout_layer)
        .init();

    info!(
        "main : Started : Application initializing : version {:?}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?.apply(cli.overrides())?;
    info!("main: Config : {}", config.describe());

    let app = Application::build(config)?;
    app.run().await?;

    info!("main: Completed");
    Ok(())
}
