//! HC-SR04 ultrasonic distance sensor.

use super::{DigitalInput, DigitalOutput, wait_while};
use crate::domain::errors::SensorError;
use crate::domain::reading::echo_distance;
use std::thread;
use std::time::Duration;

const TRIGGER_PULSE: Duration = Duration::from_micros(10);

pub struct HcSr04<T: DigitalOutput, E: DigitalInput> {
    trigger: T,
    echo: E,
    echo_timeout: Duration,
}

impl<T: DigitalOutput, E: DigitalInput> HcSr04<T, E> {
    pub fn new(trigger: T, echo: E, echo_timeout: Duration) -> Self {
        Self {
            trigger,
            echo,
            echo_timeout,
        }
    }

    /// Fires one ping and returns the round-trip time of the echo.
    ///
    /// Both echo edges are bounded by the echo timeout, so a disconnected
    /// or stuck sensor yields [`SensorError::Timeout`].
    pub fn measure_echo(&mut self) -> Result<Duration, SensorError> {
        self.trigger.set_high();
        thread::sleep(TRIGGER_PULSE);
        self.trigger.set_low();

        wait_while(&self.echo, false, self.echo_timeout, "echo rising edge")?;
        wait_while(&self.echo, true, self.echo_timeout, "echo falling edge")
    }

    pub fn measure_distance(&mut self) -> Result<f64, SensorError> {
        self.measure_echo().map(echo_distance)
    }
}
