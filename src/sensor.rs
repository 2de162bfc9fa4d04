
use thiserror::Error;

/// Errors surfaced by a sensor backend. All of these are transient from the
/// daemon's point of view except a failed startup probe, which aborts the
/// process before the sampler ever starts.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("i2c bus error: {0}")]
    Bus(#[from] rppal::i2c::Error),
    #[error("unexpected chip id {0:#04x}")]
    UnknownChip(u8),
    #[error("invalid reading: {0}")]
    InvalidData(&'static str),
}

/// A single raw sample: temperature in °C, pressure in hPa.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub pressure: f64,
}

impl Reading {
    /// Rejects readings the altitude formula has no answer for, so bad data
    /// never turns into a silent NaN downstream.
    pub fn validate(self) -> Result<Self, SensorError> {
        if !self.pressure.is_finite() || self.pressure <= 0.0 {
            return Err(SensorError::InvalidData("pressure must be positive"));
        }
        if !self.temperature.is_finite() {
            return Err(SensorError::InvalidData("temperature is not finite"));
        }
        Ok(self)
    }
}

/// Anything that can produce temperature/pressure samples. The sampler and
/// the calibration commands only ever talk to this trait.
#[cfg_attr(test, mockall::automock)]
pub trait SensorSource {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

/// Deterministic synthetic source for running without hardware (`--sim`).
/// Pressure swings a few hPa around the standard atmosphere on slow cycles.
pub struct SimulatedSensor {
    ticks: u64,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self { ticks: 0 }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for SimulatedSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let t = self.ticks as f64;
        self.ticks += 1;

        let pressure = 1013.25 + 4.0 * (t / 300.0).sin() + 0.3 * (t / 17.0).cos();
        let temperature = 21.0 + 2.0 * (t / 240.0).sin() + 0.4 * (t / 23.0).cos();

        Ok(Reading {
            temperature,
            pressure,
        })
    }
}
