//! Host implementations of the blocklink HAL
//!
//! This crate provides `std` implementations of the shared
//! `blocklink-hal` traits:
//!
//! - [`StdClock`] - monotonic clock backed by `std::time::Instant`
//! - [`IoStream`] - adapter for any non-blocking `Read + Write` handle
//! - [`SerialDevice`] - a pre-configured tty opened non-blocking (unix)
//! - [`loopback`] - in-memory duplex pipe for tests and demos

pub mod clock;
pub mod io;
pub mod loopback;
#[cfg(unix)]
pub mod serial;

// Re-export shared traits from blocklink-hal for convenience
pub use blocklink_hal::{ByteStream, Clock, StreamError};

pub use clock::StdClock;
pub use io::IoStream;
#[cfg(unix)]
pub use serial::SerialDevice;
