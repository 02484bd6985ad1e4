//! Raspberry Pi bindings for the GPIO drivers.
//!
//! Every read opens a fresh GPIO handle and releases the pins when it
//! finishes, so reads can be repeated back to back. Blocking work runs on
//! the tokio blocking pool once the per-sensor bus lock is held. The poll
//! loop and the status endpoint share one sensor instance and never
//! bit-bang the same line at the same time.

use super::dht22::{Dht22, MIN_SAMPLING_INTERVAL};
use super::hcsr04::HcSr04;
use super::{DataLine, DigitalInput, DigitalOutput};
use crate::domain::errors::SensorError;
use crate::domain::ports::{DistanceSensor, EnvironmentSensor};
use crate::domain::reading::{EnvironmentReading, TemperatureUnit};
use async_trait::async_trait;
use rppal::gpio::{Gpio, InputPin, IoPin, Mode, OutputPin};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

impl DigitalInput for IoPin {
    fn is_high(&self) -> bool {
        IoPin::is_high(self)
    }
}

impl DigitalOutput for IoPin {
    fn set_high(&mut self) {
        IoPin::set_high(self)
    }

    fn set_low(&mut self) {
        IoPin::set_low(self)
    }
}

impl DataLine for IoPin {
    fn output_mode(&mut self) {
        self.set_mode(Mode::Output);
    }

    fn input_mode(&mut self) {
        self.set_mode(Mode::Input);
    }
}

impl DigitalInput for InputPin {
    fn is_high(&self) -> bool {
        InputPin::is_high(self)
    }
}

impl DigitalOutput for OutputPin {
    fn set_high(&mut self) {
        OutputPin::set_high(self)
    }

    fn set_low(&mut self) {
        OutputPin::set_low(self)
    }
}

fn init_error(pin: u8, e: rppal::gpio::Error) -> SensorError {
    SensorError::Init {
        reason: format!("GPIO{}: {}", pin, e),
    }
}

/// Waits for the bus, then runs `work` on the blocking pool.
///
/// The bus is taken before any blocking task exists, so a caller that gives
/// up while queued never starts a hardware read.
async fn run_blocking<T, F>(bus: &Arc<Mutex<()>>, work: F) -> Result<T, SensorError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SensorError> + Send + 'static,
{
    let guard = bus.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        work()
    })
    .await
    .map_err(|e| SensorError::Unavailable {
        reason: format!("sensor task failed: {}", e),
    })?
}

/// DHT22 wired to a single GPIO data line.
pub struct GpioEnvironmentSensor {
    pin: u8,
    attempts: u32,
    unit: TemperatureUnit,
    bus: Arc<Mutex<()>>,
}

impl GpioEnvironmentSensor {
    pub fn new(pin: u8, attempts: u32, unit: TemperatureUnit) -> Self {
        Self {
            pin,
            attempts,
            unit,
            bus: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl EnvironmentSensor for GpioEnvironmentSensor {
    async fn read_environment(&self) -> Result<EnvironmentReading, SensorError> {
        let pin = self.pin;
        let attempts = self.attempts;

        let sample = run_blocking(&self.bus, move || {
            let gpio = Gpio::new().map_err(|e| init_error(pin, e))?;
            let line = gpio
                .get(pin)
                .map_err(|e| init_error(pin, e))?
                .into_io(Mode::Output);
            Dht22::new(line).read_retry(attempts, MIN_SAMPLING_INTERVAL)
        })
        .await?;

        debug!(
            "DHT22 on GPIO{}: {:.1}% {:.1}C",
            self.pin, sample.humidity, sample.celsius
        );

        Ok(EnvironmentReading {
            humidity: sample.humidity,
            temperature: self.unit.from_celsius(sample.celsius),
        })
    }
}

/// HC-SR04 wired to a trigger and an echo line.
pub struct GpioDistanceSensor {
    trigger_pin: u8,
    echo_pin: u8,
    echo_timeout: Duration,
    bus: Arc<Mutex<()>>,
}

impl GpioDistanceSensor {
    pub fn new(trigger_pin: u8, echo_pin: u8, echo_timeout: Duration) -> Self {
        Self {
            trigger_pin,
            echo_pin,
            echo_timeout,
            bus: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl DistanceSensor for GpioDistanceSensor {
    async fn read_distance(&self) -> Result<f64, SensorError> {
        let (trigger_pin, echo_pin, echo_timeout) =
            (self.trigger_pin, self.echo_pin, self.echo_timeout);

        run_blocking(&self.bus, move || {
            let gpio = Gpio::new().map_err(|e| init_error(trigger_pin, e))?;
            let trigger = gpio
                .get(trigger_pin)
                .map_err(|e| init_error(trigger_pin, e))?
                .into_output_low();
            let echo = gpio
                .get(echo_pin)
                .map_err(|e| init_error(echo_pin, e))?
                .into_input();
            HcSr04::new(trigger, echo, echo_timeout).measure_distance()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_abandoned_waiter_never_starts_a_read() {
        let bus = Arc::new(Mutex::new(()));
        let reads = Arc::new(AtomicU32::new(0));
        let held = bus.clone().lock_owned().await;

        for _ in 0..3 {
            let counter = reads.clone();
            let queued = tokio::time::timeout(
                Duration::from_millis(20),
                run_blocking(&bus, move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await;
            assert!(queued.is_err());
        }

        drop(held);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        let counter = reads.clone();
        let value = run_blocking(&bus, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reads_on_one_bus_do_not_overlap() {
        let bus = Arc::new(Mutex::new(()));
        let active = Arc::new(AtomicU32::new(0));
        let overlapped = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let bus = bus.clone();
            let active = active.clone();
            let overlapped = overlapped.clone();
            handles.push(tokio::spawn(async move {
                run_blocking(&bus, move || {
                    if active.fetch_add(1, Ordering::SeqCst) > 0 {
                        overlapped.fetch_add(1, Ordering::SeqCst);
                    }
                    std::thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(overlapped.load(Ordering::SeqCst), 0);
    }
}
