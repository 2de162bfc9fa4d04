
use std::sync::Mutex;

use log::info;

use crate::altitude::altitude_from_pressure;
use crate::calibration::CalibrationState;
use crate::sensor::{SensorError, SensorSource};

/// Command tokens a client may send on its connection. Neither carries a
/// payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SetReference,
    SetBaroOffset,
}

impl Command {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "set_reference" => Some(Self::SetReference),
            "set_baro_offset" => Some(Self::SetBaroOffset),
            _ => None,
        }
    }
}

/// Runs a command, independent of the sampler's cadence.
///
/// `SetReference` takes a fresh sensor reading on purpose rather than the
/// last sampled value: the reference should capture ground truth at the
/// moment of the command. If that read fails, the command fails and the
/// calibration is left unchanged.
///
/// `SetBaroOffset` is a protocol placeholder with no defined semantics; it
/// is logged and deliberately does nothing.
pub fn apply<S: SensorSource>(
    cmd: Command,
    sensor: &Mutex<S>,
    calibration: &CalibrationState,
) -> Result<(), SensorError> {
    match cmd {
        Command::SetReference => {
            let reading = sensor.lock().unwrap().read()?.validate()?;
            let reference = altitude_from_pressure(reading.pressure);
            calibration.set_reference(reference);
            info!("reference altitude set to {reference:.1} m");
            Ok(())
        }
        Command::SetBaroOffset => {
            info!("set_baro_offset received; command currently has no effect");
            Ok(())
        }
    }
}
