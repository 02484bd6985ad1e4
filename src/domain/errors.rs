use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a sensor
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Sensor initialization failed: {reason}")]
    Init { reason: String },

    #[error("Timed out after {waited_us}us waiting for {phase}")]
    Timeout { phase: &'static str, waited_us: u64 },

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    #[error("Implausible reading: {reason}")]
    InvalidReading { reason: String },

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<SensorError>,
    },

    #[error("Sensor unavailable: {reason}")]
    Unavailable { reason: String },
}

impl SensorError {
    pub fn timeout(phase: &'static str, waited: Duration) -> Self {
        SensorError::Timeout {
            phase,
            waited_us: waited.as_micros() as u64,
        }
    }

    /// Stable label used for the `kind` dimension of the error counter.
    /// Exhausted retries report the kind of the final failure.
    pub fn kind(&self) -> &'static str {
        match self {
            SensorError::Init { .. } => "init",
            SensorError::Timeout { .. } => "timeout",
            SensorError::Checksum { .. } => "checksum",
            SensorError::InvalidReading { .. } => "invalid",
            SensorError::RetriesExhausted { last, .. } => last.kind(),
            SensorError::Unavailable { .. } => "unavailable",
        }
    }
}

/// Errors that end the agent process
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to bind {listener} listener on {addr}: {source}")]
    Bind {
        listener: &'static str,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{listener} listener failed: {source}")]
    Serve {
        listener: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not stop API listener gracefully within {grace:?}")]
    ShutdownTimeout { grace: Duration },

    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
