//! Serial block exchange
//!
//! Usage: `blocklink-host [CONFIG]`
//!
//! Opens the configured serial device and runs the request/reply exchange.
//! The device must already be set up for raw 8-bit transfers at the agreed
//! baud rate. Log output is controlled with `RUST_LOG` (default `info`).

mod config;
mod exchange;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use blocklink_hal_std::{SerialDevice, StdClock};
use blocklink_protocol::BlockLink;

use crate::config::{HostConfig, DEFAULT_CONFIG_PATH};
use crate::exchange::Exchange;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = HostConfig::load(&config_path)?;

    let device = SerialDevice::open(&config.device)
        .with_context(|| format!("failed to open {}", config.device.display()))?;

    let link = BlockLink::with_config(device, StdClock::new(), config.link);
    let mut exchange = Exchange::new(link, config.length);
    exchange.run(
        config.role,
        config.rounds,
        Duration::from_millis(config.pause_ms),
    )
}
