#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use log::warn;
use tokio::time::MissedTickBehavior;

use crate::altitude::{altitude_from_pressure, round_tenth};
use crate::broadcast::Broadcaster;
use crate::calibration::CalibrationState;
use crate::history::{HistoryStore, SeriesId};
use crate::payload::Snapshot;
use crate::sensor::{Reading, SensorSource};

/// The periodic producer. Once per interval it reads the sensor, derives
/// altitude and relative altitude, appends and prunes the history series,
/// and hands one snapshot to the broadcaster.
///
/// A failed sensor read skips the whole tick: the sample is simply absent
/// from history and nothing is retried out of band.
pub struct Sampler<S> {
    sensor: Arc<Mutex<S>>,
    calibration: Arc<CalibrationState>,
    history: Arc<Mutex<HistoryStore>>,
    broadcaster: Arc<Broadcaster>,
}

impl<S: SensorSource> Sampler<S> {
    pub fn new(
        sensor: Arc<Mutex<S>>,
        calibration: Arc<CalibrationState>,
        history: Arc<Mutex<HistoryStore>>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            sensor,
            calibration,
            history,
            broadcaster,
        }
    }

    /// One sampling cycle. `now` is captured once and stamps both series.
    pub fn tick(&self, now: f64) {
        let reading = self.sensor.lock().unwrap().read();
        let reading = match reading.and_then(Reading::validate) {
            Ok(r) => r,
            Err(e) => {
                warn!("sensor read failed, skipping tick: {e}");
                return;
            }
        };

        let temperature = round_tenth(reading.temperature);
        let altitude = round_tenth(altitude_from_pressure(reading.pressure));
        let relative_altitude = round_tenth(self.calibration.relative(altitude));

        let (temperature_history, altitude_history) = {
            let mut history = self.history.lock().unwrap();
            history.append(SeriesId::Temperature, now, temperature);
            history.append(SeriesId::RelativeAltitude, now, relative_altitude);
            history.prune_all(now);
            (
                history.snapshot(SeriesId::Temperature),
                history.snapshot(SeriesId::RelativeAltitude),
            )
        };

        self.broadcaster.publish(&Snapshot {
            temperature,
            pressure: reading.pressure,
            altitude,
            relative_altitude,
            temperature_history,
            altitude_history,
        });
    }

    /// Runs ticks at a fixed cadence for the life of the process. A tick
    /// that overruns its slot is skipped, never replayed as a burst.
    pub async fn run(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.tick(epoch_seconds());
        }
    }
}

fn epoch_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
