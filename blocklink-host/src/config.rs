//! Host configuration
//!
//! Loaded from a TOML file. Every key is optional:
//!
//! ```toml
//! device = "/dev/ttyPS1"
//! role = "responder"     # or "initiator"
//! length = 40            # bytes per transfer, agreed with the peer
//! rounds = 0             # 0 = run until interrupted
//! pause_ms = 2000        # pause between rounds
//!
//! [link]
//! timeout_ms = 5000      # 0 = wait forever
//! poll_interval_us = 100
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use blocklink_protocol::LinkConfig;
use serde::Deserialize;

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "blocklink.toml";

/// Which side of the exchange this host plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Wait for a buffer, print it, answer with the reply pattern
    #[default]
    Responder,
    /// Send the request pattern, print the reply
    Initiator,
}

/// Complete host configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Serial device, already configured for raw 8-bit transfers
    pub device: PathBuf,
    pub role: Role,
    /// Bytes per transfer
    pub length: usize,
    /// Rounds to run (0 = forever)
    pub rounds: u32,
    /// Pause between rounds in milliseconds
    pub pause_ms: u64,
    pub link: LinkConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyPS1"),
            role: Role::Responder,
            length: 40,
            rounds: 0,
            pause_ms: 2000,
            link: LinkConfig::with_timeout_ms(5000),
        }
    }
}

impl HostConfig {
    /// Parse a configuration from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        let config: HostConfig = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file at `path`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::parse(&text)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                log::info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("{} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.length == 0 {
            bail!("length must be at least 1 byte");
        }
        Ok(())
    }
}
