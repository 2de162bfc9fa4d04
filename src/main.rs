use std::env;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use log::info;
use tokio::net::TcpListener;

mod altitude;
mod bmp280;
mod broadcast;
mod calibration;
mod command;
mod config;
mod history;
mod payload;
mod sampler;
mod sensor;
mod server;

use broadcast::Broadcaster;
use calibration::CalibrationState;
use config::Config;
use history::HistoryStore;
use sampler::Sampler;
use sensor::{SensorSource, SimulatedSensor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let cfg = Config::from_args(&args)?;

    if cfg.simulate {
        info!("using simulated sensor");
        run(SimulatedSensor::new(), cfg).await
    } else {
        let sensor = bmp280::Bmp280::new(cfg.i2c_bus, cfg.i2c_addr).with_context(|| {
            format!(
                "failed to open BMP280 at {:#04x} on i2c bus {}",
                cfg.i2c_addr, cfg.i2c_bus
            )
        })?;
        run(sensor, cfg).await
    }
}

async fn run<S>(sensor: S, cfg: Config) -> anyhow::Result<()>
where
    S: SensorSource + Send + 'static,
{
    let sensor = Arc::new(Mutex::new(sensor));
    let calibration = Arc::new(CalibrationState::new());
    let history = Arc::new(Mutex::new(HistoryStore::new(cfg.window_secs)));
    let broadcaster = Arc::new(Broadcaster::new());

    let sampler = Sampler::new(
        sensor.clone(),
        calibration.clone(),
        history,
        broadcaster.clone(),
    );
    tokio::spawn(sampler.run(cfg.sample_interval));

    let listener = TcpListener::bind(cfg.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;

    tokio::select! {
        r = server::serve(listener, sensor, calibration, broadcaster) => r,
    }
}
