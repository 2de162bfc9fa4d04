use super::*;

use tokio::sync::mpsc;

use crate::broadcast::SUBSCRIBER_QUEUE_DEPTH;
use crate::command::{self, Command};
use crate::history::RETENTION_WINDOW_SECS;
use crate::sensor::{MockSensorSource, SensorError};

struct Fixture {
    sensor: Arc<Mutex<MockSensorSource>>,
    calibration: Arc<CalibrationState>,
    history: Arc<Mutex<HistoryStore>>,
    broadcaster: Arc<Broadcaster>,
}

impl Fixture {
    fn new(mock: MockSensorSource) -> Self {
        Self {
            sensor: Arc::new(Mutex::new(mock)),
            calibration: Arc::new(CalibrationState::new()),
            history: Arc::new(Mutex::new(HistoryStore::new(RETENTION_WINDOW_SECS))),
            broadcaster: Arc::new(Broadcaster::new()),
        }
    }

    fn sampler(&self) -> Sampler<MockSensorSource> {
        Sampler::new(
            self.sensor.clone(),
            self.calibration.clone(),
            self.history.clone(),
            self.broadcaster.clone(),
        )
    }
}

fn constant_reading(temperature: f64, pressure: f64) -> MockSensorSource {
    let mut mock = MockSensorSource::new();
    mock.expect_read().returning(move || {
        Ok(Reading {
            temperature,
            pressure,
        })
    });
    mock
}

#[test]
fn tick_appends_both_series_and_publishes() {
    let fixture = Fixture::new(constant_reading(20.0, SEA_LEVEL));
    let (tx, mut rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
    fixture.broadcaster.register(tx);

    fixture.sampler().tick(100.0);

    let history = fixture.history.lock().unwrap();
    assert_eq!(history.snapshot(SeriesId::Temperature), vec![(100.0, 20.0)]);
    assert_eq!(
        history.snapshot(SeriesId::RelativeAltitude),
        vec![(100.0, 0.0)]
    );
    drop(history);

    let frame = rx.try_recv().unwrap();
    let v: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(v["temperature"], 20.0);
    assert_eq!(v["pressure"], SEA_LEVEL);
    assert_eq!(v["altitude"], 0.0);
    assert_eq!(v["relative_altitude"], 0.0);
}

#[test]
fn failed_read_skips_the_tick() {
    let mut mock = MockSensorSource::new();
    mock.expect_read()
        .returning(|| Err(SensorError::InvalidData("bus held low")));
    let fixture = Fixture::new(mock);
    let (tx, mut rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
    fixture.broadcaster.register(tx);

    let sampler = fixture.sampler();
    sampler.tick(100.0);
    sampler.tick(101.0);

    assert_eq!(fixture.history.lock().unwrap().len(SeriesId::Temperature), 0);
    assert!(rx.try_recv().is_err());
    // failing to read is not a delivery failure; the subscriber stays
    assert_eq!(fixture.broadcaster.subscriber_count(), 1);
}

#[test]
fn invalid_pressure_skips_the_tick() {
    let fixture = Fixture::new(constant_reading(20.0, -5.0));
    fixture.sampler().tick(100.0);
    assert_eq!(fixture.history.lock().unwrap().len(SeriesId::Temperature), 0);
}

const SEA_LEVEL: f64 = 1013.25;

#[test]
fn calibration_scenario_end_to_end() {
    // tick at sea level, tick at 1000 hPa, calibrate at 1000 hPa,
    // tick at 990 hPa
    let pressures = [SEA_LEVEL, 1000.0, 1000.0, 990.0];
    let mut calls = 0usize;
    let mut mock = MockSensorSource::new();
    mock.expect_read().returning(move || {
        let pressure = pressures[calls.min(pressures.len() - 1)];
        calls += 1;
        Ok(Reading {
            temperature: 20.0,
            pressure,
        })
    });
    let fixture = Fixture::new(mock);
    let (tx, mut rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
    fixture.broadcaster.register(tx);
    let sampler = fixture.sampler();

    sampler.tick(0.0);
    let v: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(v["altitude"], 0.0);
    assert_eq!(v["relative_altitude"], 0.0);

    sampler.tick(1.0);
    let v: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert!((v["altitude"].as_f64().unwrap() - 110.9).abs() < 0.3);
    assert_eq!(v["relative_altitude"], 0.0); // still uncalibrated

    command::apply(
        Command::SetReference,
        &fixture.sensor,
        &fixture.calibration,
    )
    .unwrap();
    let reference = fixture.calibration.reference().unwrap();
    assert!((reference - 110.9).abs() < 0.3);

    sampler.tick(2.0);
    let v: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    let altitude = v["altitude"].as_f64().unwrap();
    let relative = v["relative_altitude"].as_f64().unwrap();
    assert!((altitude - 195.4).abs() < 0.3);
    assert!((relative - 84.5).abs() < 0.3);

    let history = fixture.history.lock().unwrap();
    let temps = history.snapshot(SeriesId::Temperature);
    assert_eq!(temps.iter().map(|&(t, _)| t).collect::<Vec<_>>(), vec![
        0.0, 1.0, 2.0
    ]);
}

#[test]
fn long_run_retains_at_most_the_window() {
    let fixture = Fixture::new(constant_reading(20.0, 1000.0));
    let sampler = fixture.sampler();

    for t in 0..7300 {
        sampler.tick(t as f64);
    }

    let history = fixture.history.lock().unwrap();
    let snap = history.snapshot(SeriesId::RelativeAltitude);
    let latest = snap.last().unwrap().0;
    let oldest = snap.first().unwrap().0;
    assert_eq!(latest, 7299.0);
    assert!(oldest >= latest - RETENTION_WINDOW_SECS);
    assert_eq!(snap.len(), 7201);
    assert_eq!(history.len(SeriesId::Temperature), 7201);
}
