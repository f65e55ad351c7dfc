//! Adapter from `std::io` handles to [`ByteStream`]
//!
//! The wrapped handle must be in non-blocking mode: a read with nothing
//! pending has to fail with [`io::ErrorKind::WouldBlock`] instead of
//! parking the thread, otherwise transfer timeouts cannot fire.

use std::io::{self, Read, Write};

use blocklink_hal::{ByteStream, StreamError};

/// Scratch size used when draining pending input
const DRAIN_CHUNK: usize = 64;

/// Map an `io::Error` onto the stream error taxonomy
pub(crate) fn classify(e: io::Error) -> StreamError<io::Error> {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => StreamError::WouldBlock,
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::UnexpectedEof => StreamError::Closed,
        _ => StreamError::Io(e),
    }
}

/// [`ByteStream`] over a non-blocking `Read + Write` handle
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
}

impl<T: Read + Write> IoStream<T> {
    /// Wrap a handle that is already in non-blocking mode
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Get a reference to the wrapped handle
    pub fn get_ref(&self) -> &T {
        &self.inner
    }
}

impl<T: Read + Write> ByteStream for IoStream<T> {
    type Error = io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError<io::Error>> {
        let written = self.inner.write(data).map_err(classify)?;
        // The bytes are already accepted; a failed flush must not hide that
        if let Err(e) = self.inner.flush() {
            log::debug!("Flush after writing {} bytes failed: {}", written, e);
        }
        Ok(written)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError<io::Error>> {
        read_handle(&mut self.inner, buf)
    }

    fn discard_input(&mut self) -> Result<(), StreamError<io::Error>> {
        drain(&mut self.inner)
    }
}

/// Read from a non-blocking handle, reporting end of file as a closed stream
pub(crate) fn read_handle<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<usize, StreamError<io::Error>> {
    match reader.read(buf).map_err(classify)? {
        0 if !buf.is_empty() => Err(StreamError::Closed),
        n => Ok(n),
    }
}

/// Read and drop pending bytes until the handle reports nothing left
pub(crate) fn drain<R: Read>(reader: &mut R) -> Result<(), StreamError<io::Error>> {
    let mut scratch = [0u8; DRAIN_CHUNK];
    let mut dropped = 0usize;
    loop {
        match reader.read(&mut scratch).map_err(classify) {
            Ok(0) | Err(StreamError::WouldBlock) => break,
            Ok(n) => dropped += n,
            Err(e) => return Err(e),
        }
    }
    if dropped > 0 {
        log::debug!("Discarded {} pending input bytes", dropped);
    }
    Ok(())
}
