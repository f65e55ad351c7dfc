//! Link configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default pause between polls of an idle stream (microseconds)
pub const DEFAULT_POLL_INTERVAL_US: u32 = 100;

/// Transfer timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// How long a single read may wait for data, in milliseconds
    ///
    /// Zero waits forever.
    pub timeout_ms: u32,
    /// Pause between polls while waiting for data, in microseconds
    pub poll_interval_us: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }
}

impl LinkConfig {
    /// Default configuration with a read timeout
    pub fn with_timeout_ms(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            ..Self::default()
        }
    }

    /// Whether reads wait without a deadline
    pub fn waits_forever(&self) -> bool {
        self.timeout_ms == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_waits_forever() {
        let config = LinkConfig::default();
        assert!(config.waits_forever());
        assert_eq!(config.poll_interval_us, DEFAULT_POLL_INTERVAL_US);
    }

    #[test]
    fn test_with_timeout() {
        let config = LinkConfig::with_timeout_ms(5000);
        assert_eq!(config.timeout_ms, 5000);
        assert!(!config.waits_forever());
    }
}
