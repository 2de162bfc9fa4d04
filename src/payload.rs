
use serde::Serialize;

/// The per-tick wire payload: latest readings plus the bounded history of
/// both tracked series. History entries serialize as `[timestamp, value]`
/// pairs; timestamps are numeric epoch seconds everywhere, never formatted
/// date strings.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub temperature: f64,
    pub pressure: f64,
    pub altitude: f64,
    pub relative_altitude: f64,
    pub temperature_history: Vec<(f64, f64)>,
    pub altitude_history: Vec<(f64, f64)>,
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
