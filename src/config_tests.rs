use crate::config::{Config, SensorBackend};
use crate::domain::reading::TemperatureUnit;
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const KEYS: &[&str] = &[
    "CEMS_WEB_API_HOST",
    "CEMS_WEB_DEBUG_HOST",
    "CEMS_WEB_METRICS_HOST",
    "CEMS_WEB_READ_TIMEOUT",
    "CEMS_WEB_WRITE_TIMEOUT",
    "CEMS_WEB_SHUTDOWN_TIMEOUT",
    "CEMS_APP_POLL_SECS",
    "CEMS_SENSOR_BACKEND",
    "CEMS_SENSOR_DHT_PIN",
    "CEMS_SENSOR_TRIGGER_PIN",
    "CEMS_SENSOR_ECHO_PIN",
    "CEMS_SENSOR_READ_RETRIES",
    "CEMS_SENSOR_TEMPERATURE_UNIT",
    "CEMS_SENSOR_ECHO_TIMEOUT",
    "CEMS_SENSOR_WATER_LEVEL_ENABLED",
];

fn clear_env() {
    for key in KEYS {
        // SAFETY: callers hold ENV_LOCK, so no other test touches the environment.
        unsafe { env::remove_var(key) };
    }
}

fn set(key: &str, value: &str) {
    // SAFETY: callers hold ENV_LOCK.
    unsafe { env::set_var(key, value) };
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config.web.api_host, "0.0.0.0:3500");
    assert_eq!(config.web.debug_host, "0.0.0.0:4000");
    assert_eq!(config.web.metrics_host, "0.0.0.0:2112");
    assert_eq!(config.web.read_timeout, Duration::from_secs(5));
    assert_eq!(config.web.write_timeout, Duration::from_secs(5));
    assert_eq!(config.web.shutdown_timeout, Duration::from_secs(5));
    assert_eq!(config.app.poll_interval, Duration::from_secs(5));
    assert_eq!(config.sensor.backend, SensorBackend::Gpio);
    assert_eq!(config.sensor.dht_pin, 4);
    assert_eq!(config.sensor.trigger_pin, 23);
    assert_eq!(config.sensor.echo_pin, 24);
    assert_eq!(config.sensor.read_retries, 11);
    assert_eq!(config.sensor.temperature_unit, TemperatureUnit::Fahrenheit);
    assert!(config.sensor.water_level_enabled);
}

#[test]
fn test_config_from_env_overrides() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    set("CEMS_WEB_API_HOST", "127.0.0.1:9000");
    set("CEMS_WEB_READ_TIMEOUT", "1500ms");
    set("CEMS_APP_POLL_SECS", "30s");
    set("CEMS_SENSOR_BACKEND", "simulated");
    set("CEMS_SENSOR_DHT_PIN", "17");
    set("CEMS_SENSOR_TEMPERATURE_UNIT", "celsius");
    set("CEMS_SENSOR_WATER_LEVEL_ENABLED", "false");

    let config = Config::from_env().unwrap();

    assert_eq!(config.web.api_host, "127.0.0.1:9000");
    assert_eq!(config.web.read_timeout, Duration::from_millis(1500));
    assert_eq!(config.app.poll_interval, Duration::from_secs(30));
    assert_eq!(config.sensor.backend, SensorBackend::Simulated);
    assert_eq!(config.sensor.dht_pin, 17);
    assert_eq!(config.sensor.temperature_unit, TemperatureUnit::Celsius);
    assert!(!config.sensor.water_level_enabled);

    clear_env();
}

#[test]
fn test_config_rejects_invalid_values() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    set("CEMS_WEB_WRITE_TIMEOUT", "soon");
    let err = Config::from_env().unwrap_err();
    assert!(format!("{:#}", err).contains("CEMS_WEB_WRITE_TIMEOUT"));
    clear_env();

    set("CEMS_SENSOR_ECHO_PIN", "300");
    assert!(Config::from_env().is_err());
    clear_env();

    set("CEMS_SENSOR_READ_RETRIES", "0");
    assert!(Config::from_env().is_err());
    clear_env();

    set("CEMS_APP_POLL_SECS", "0s");
    assert!(Config::from_env().is_err());
    clear_env();
}
