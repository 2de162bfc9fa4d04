
use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::broadcast::{Broadcaster, Frame, SUBSCRIBER_QUEUE_DEPTH};
use crate::calibration::CalibrationState;
use crate::command::{self, Command};
use crate::sensor::SensorSource;

/// Accept loop. Each connection gets its own task; nothing a client does can
/// reach the sampler or another client.
pub async fn serve<S>(
    listener: TcpListener,
    sensor: Arc<Mutex<S>>,
    calibration: Arc<CalibrationState>,
    broadcaster: Arc<Broadcaster>,
) -> Result<()>
where
    S: SensorSource + Send + 'static,
{
    info!("listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("client connected from {peer}");
        let sensor = sensor.clone();
        let calibration = calibration.clone();
        let broadcaster = broadcaster.clone();
        tokio::spawn(async move {
            handle_client(stream, sensor, calibration, broadcaster).await;
            info!("client {peer} disconnected");
        });
    }
}

/// One connection: registers a bounded queue with the broadcaster, forwards
/// frames to the socket as newline-delimited JSON, and reads command tokens
/// off the same socket until it closes. Any exit path deregisters.
async fn handle_client<S>(
    stream: TcpStream,
    sensor: Arc<Mutex<S>>,
    calibration: Arc<CalibrationState>,
    broadcaster: Arc<Broadcaster>,
) where
    S: SensorSource + Send + 'static,
{
    let (reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::channel::<Frame>(SUBSCRIBER_QUEUE_DEPTH);
    let id = broadcaster.register(tx);

    let forward = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if writer.write_all(frame.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        match Command::parse(token) {
            Some(cmd) => {
                if let Err(e) = command::apply(cmd, &sensor, &calibration) {
                    warn!("command {token:?} failed: {e}");
                }
            }
            None => debug!("ignoring unknown command {token:?}"),
        }
    }

    broadcaster.unregister(id);
    forward.abort();
}
