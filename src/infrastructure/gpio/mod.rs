//! Bit-banged GPIO sensor drivers.
//!
//! The drivers are written against the small line traits below so the timing
//! logic can run against scripted lines in tests. [`rpi`] binds them to the
//! Raspberry Pi GPIO controller.

pub mod dht22;
pub mod hcsr04;
pub mod rpi;

use crate::domain::errors::SensorError;
use std::time::{Duration, Instant};

pub use rpi::{GpioDistanceSensor, GpioEnvironmentSensor};

/// A line that can be sampled.
pub trait DigitalInput {
    fn is_high(&self) -> bool;

    /// Clock used to time pulses on this line.
    fn timestamp(&self) -> Instant {
        Instant::now()
    }
}

/// A line that can be driven.
pub trait DigitalOutput {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// A single data line that switches between driving and sampling, as the
/// DHT22 one-wire protocol requires.
pub trait DataLine: DigitalInput + DigitalOutput {
    fn output_mode(&mut self);
    fn input_mode(&mut self);
}

/// Busy-waits while `line` stays at `level`.
///
/// Returns how long the level was held, or a timeout error naming `phase`
/// once `limit` has elapsed without a transition.
pub fn wait_while<L: DigitalInput + ?Sized>(
    line: &L,
    level: bool,
    limit: Duration,
    phase: &'static str,
) -> Result<Duration, SensorError> {
    let started = line.timestamp();
    while line.is_high() == level {
        let held = line.timestamp().duration_since(started);
        if held > limit {
            return Err(SensorError::timeout(phase, held));
        }
        std::hint::spin_loop();
    }
    Ok(line.timestamp().duration_since(started))
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedInput;
    use super::*;

    #[test]
    fn test_wait_while_returns_on_transition() {
        let line = ScriptedInput::new(vec![(false, 5)], true);
        let held = wait_while(&line, false, Duration::from_millis(50), "rise").unwrap();
        // five low samples plus the one that saw the rise
        assert_eq!(held, Duration::from_micros(6));
    }

    #[test]
    fn test_wait_while_times_out_on_stuck_line() {
        let line = ScriptedInput::constant(false);
        let err = wait_while(&line, false, Duration::from_millis(2), "rise").unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(err.to_string().contains("rise"));
    }
}
