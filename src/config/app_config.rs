use super::env_duration;
use anyhow::Result;
use std::time::Duration;

/// Poll loop configuration
#[derive(Debug, Clone)]
pub struct AppEnvConfig {
    pub poll_interval: Duration,
}

impl Default for AppEnvConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl AppEnvConfig {
    pub fn from_env() -> Result<Self> {
        let poll_interval = env_duration("CEMS_APP_POLL_SECS", Self::default().poll_interval)?;
        if poll_interval.is_zero() {
            anyhow::bail!("CEMS_APP_POLL_SECS must be greater than zero");
        }
        Ok(Self { poll_interval })
    }
}
