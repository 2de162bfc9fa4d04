
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::bmp280::DEFAULT_I2C_ADDR;
use crate::history::RETENTION_WINDOW_SECS;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub sample_interval: Duration,
    pub window_secs: f64,
    pub i2c_bus: u8,
    pub i2c_addr: u16,
    pub simulate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".parse().unwrap(),
            sample_interval: Duration::from_secs(1),
            window_secs: RETENTION_WINDOW_SECS,
            i2c_bus: 1,
            i2c_addr: DEFAULT_I2C_ADDR,
            simulate: false,
        }
    }
}

impl Config {
    /// Parses the flags after the executable name. Unknown flags are an
    /// error rather than silently ignored.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut cfg = Config::default();
        let mut it = args.iter().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--listen" => {
                    cfg.listen_addr = value(&mut it, "--listen")?
                        .parse()
                        .context("--listen expects host:port")?;
                }
                "--interval" => {
                    let secs: u64 = value(&mut it, "--interval")?
                        .parse()
                        .context("--interval expects whole seconds")?;
                    if secs == 0 {
                        bail!("--interval must be at least 1 second");
                    }
                    cfg.sample_interval = Duration::from_secs(secs);
                }
                "--window" => {
                    let secs: f64 = value(&mut it, "--window")?
                        .parse()
                        .context("--window expects seconds")?;
                    if !(secs > 0.0) {
                        bail!("--window must be positive");
                    }
                    cfg.window_secs = secs;
                }
                "--i2c-bus" => {
                    cfg.i2c_bus = value(&mut it, "--i2c-bus")?
                        .parse()
                        .context("--i2c-bus expects a bus number")?;
                }
                "--i2c-addr" => {
                    let raw = value(&mut it, "--i2c-addr")?;
                    let digits = raw.strip_prefix("0x").unwrap_or(raw);
                    cfg.i2c_addr = u16::from_str_radix(digits, 16)
                        .with_context(|| format!("--i2c-addr expects hex, got {raw:?}"))?;
                }
                "--sim" => cfg.simulate = true,
                other => bail!("unknown argument {other:?}"),
            }
        }
        Ok(cfg)
    }
}

fn value<'a>(it: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a str> {
    it.next()
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}
