//! DHT22 / AM2302 temperature and humidity sensor.
//!
//! Protocol: the host holds the data line low for at least 1ms and releases
//! it. The sensor answers with 80us low / 80us high, then sends 40 bits. Each
//! bit is a ~50us low followed by a high pulse of ~27us (`0`) or ~70us (`1`).
//! The five bytes are humidity (2), temperature (2) and a checksum.

use super::{DataLine, wait_while};
use crate::domain::errors::SensorError;
use std::thread;
use std::time::Duration;
use tracing::debug;

const START_SIGNAL: Duration = Duration::from_millis(2);
const RESPONSE_TIMEOUT: Duration = Duration::from_micros(200);
const BIT_TIMEOUT: Duration = Duration::from_micros(150);
const ONE_BIT_THRESHOLD: Duration = Duration::from_micros(50);

/// The sensor refuses to sample more often than this.
pub const MIN_SAMPLING_INTERVAL: Duration = Duration::from_secs(2);

const FRAME_BITS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dht22Sample {
    pub humidity: f64,
    pub celsius: f64,
}

pub struct Dht22<L: DataLine> {
    line: L,
}

impl<L: DataLine> Dht22<L> {
    pub fn new(line: L) -> Self {
        Self { line }
    }

    /// Reads until one attempt succeeds or `attempts` have failed, sleeping
    /// `pause` between attempts.
    pub fn read_retry(
        &mut self,
        attempts: u32,
        pause: Duration,
    ) -> Result<Dht22Sample, SensorError> {
        let mut last = None;

        for attempt in 1..=attempts {
            match self.read_once() {
                Ok(sample) => return Ok(sample),
                Err(e) => {
                    debug!("DHT22: attempt {}/{} failed: {}", attempt, attempts, e);
                    last = Some(e);
                }
            }
            if attempt < attempts {
                thread::sleep(pause);
            }
        }

        match last {
            Some(last) => Err(SensorError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            }),
            None => Err(SensorError::Unavailable {
                reason: "no read attempted".to_string(),
            }),
        }
    }

    pub fn read_once(&mut self) -> Result<Dht22Sample, SensorError> {
        self.line.output_mode();
        self.line.set_low();
        thread::sleep(START_SIGNAL);
        self.line.set_high();
        self.line.input_mode();

        wait_while(&self.line, true, RESPONSE_TIMEOUT, "DHT22 response")?;
        wait_while(&self.line, false, RESPONSE_TIMEOUT, "DHT22 response low")?;
        wait_while(&self.line, true, RESPONSE_TIMEOUT, "DHT22 response high")?;

        let mut pulses = [Duration::ZERO; FRAME_BITS];
        for pulse in pulses.iter_mut() {
            wait_while(&self.line, false, BIT_TIMEOUT, "DHT22 bit start")?;
            *pulse = wait_while(&self.line, true, BIT_TIMEOUT, "DHT22 bit value")?;
        }

        decode_frame(pulses_to_frame(&pulses))
    }
}

/// Packs high-pulse widths into bytes, most significant bit first.
pub fn pulses_to_frame(pulses: &[Duration; FRAME_BITS]) -> [u8; 5] {
    let mut frame = [0u8; 5];
    for (i, pulse) in pulses.iter().enumerate() {
        if *pulse > ONE_BIT_THRESHOLD {
            frame[i / 8] |= 1 << (7 - i % 8);
        }
    }
    frame
}

pub fn decode_frame(frame: [u8; 5]) -> Result<Dht22Sample, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum {
            expected: sum,
            actual: frame[4],
        });
    }

    let humidity = f64::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
    let magnitude = f64::from(u16::from_be_bytes([frame[2] & 0x7F, frame[3]])) / 10.0;
    let celsius = if frame[2] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    if !(0.0..=100.0).contains(&humidity) {
        return Err(SensorError::InvalidReading {
            reason: format!("humidity {:.1}% out of range", humidity),
        });
    }
    if !(-40.0..=80.0).contains(&celsius) {
        return Err(SensorError::InvalidReading {
            reason: format!("temperature {:.1}C out of range", celsius),
        });
    }

    Ok(Dht22Sample { humidity, celsius })
}
