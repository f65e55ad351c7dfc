//! Byte stream abstractions
//!
//! Provides the duplex channel trait that block transfers run over. The
//! channel must already be opened and configured (baud rate, parity, raw
//! mode); this trait only moves bytes.

use core::fmt;

/// Error from a byte stream operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamError<E> {
    /// No data available yet (non-blocking read found nothing)
    WouldBlock,
    /// The stream has been closed
    Closed,
    /// Underlying device error
    Io(E),
}

impl<E> StreamError<E> {
    /// Check if this is the "no data yet" signal
    pub fn is_would_block(&self) -> bool {
        matches!(self, StreamError::WouldBlock)
    }
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::WouldBlock => f.write_str("no data available"),
            StreamError::Closed => f.write_str("stream closed"),
            StreamError::Io(e) => write!(f, "device error: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for StreamError<E> {}

/// Non-blocking duplex byte stream
///
/// Both directions share one channel. Reads never block: when nothing has
/// arrived yet they return [`StreamError::WouldBlock`] so the caller can
/// enforce its own deadline.
pub trait ByteStream {
    /// Device error type
    type Error;

    /// Write bytes to the stream
    ///
    /// Returns the number of bytes accepted, which may be fewer than
    /// `data.len()`.
    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError<Self::Error>>;

    /// Read whatever bytes are available, up to `buf.len()`
    ///
    /// Returns [`StreamError::WouldBlock`] when no data is available yet.
    /// A return of `Ok(0)` is treated the same way by callers.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError<Self::Error>>;

    /// Discard any received bytes not yet read
    fn discard_input(&mut self) -> Result<(), StreamError<Self::Error>>;

    /// Write a single byte
    ///
    /// Returns `Ok(false)` if the stream accepted nothing.
    fn write_byte(&mut self, byte: u8) -> Result<bool, StreamError<Self::Error>> {
        Ok(self.write(&[byte])? == 1)
    }
}

impl<T: ByteStream + ?Sized> ByteStream for &mut T {
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError<Self::Error>> {
        T::write(self, data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError<Self::Error>> {
        T::read(self, buf)
    }

    fn discard_input(&mut self) -> Result<(), StreamError<Self::Error>> {
        T::discard_input(self)
    }
}
