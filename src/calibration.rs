
use std::sync::Mutex;

/// Operator-set reference altitude. Written by calibration commands from any
/// client connection, read by every sampler tick; the mutex guarantees a
/// reader sees either the old or the new reference, never a torn value.
///
/// No reference set means "uncalibrated", which is not an error: relative
/// altitude simply reads 0.0 until the first successful `set_reference`.
#[derive(Debug, Default)]
pub struct CalibrationState {
    reference: Mutex<Option<f64>>,
}

impl CalibrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the stored reference. Always succeeds; calling again just
    /// updates it.
    pub fn set_reference(&self, altitude: f64) {
        *self.reference.lock().unwrap() = Some(altitude);
    }

    pub fn reference(&self) -> Option<f64> {
        *self.reference.lock().unwrap()
    }

    /// Altitude relative to the reference, or 0.0 while uncalibrated.
    pub fn relative(&self, altitude: f64) -> f64 {
        match *self.reference.lock().unwrap() {
            Some(reference) => altitude - reference,
            None => 0.0,
        }
    }
}
