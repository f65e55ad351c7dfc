//! Block transfer engine
//!
//! [`BlockLink`] moves whole buffers over a [`ByteStream`]. Outbound buffers
//! are cut into blocks of up to [`MAX_BLOCK_SIZE`] bytes; each block is
//! written as a header byte followed by its payload, and the sender waits for
//! the receiver to echo the header before moving on.
//!
//! ```text
//!  sender                               receiver
//!    │  HEADER │ PAYLOAD (1-8 bytes)       │
//!    │──────────────────────────────────▶ │  verify order, size, checksum
//!    │                          HEADER     │
//!    │ ◀──────────────────────────────────│  echo = acknowledgment
//!    │  next block ...                     │
//! ```
//!
//! There is no end-of-transfer marker: both sides must agree on the length
//! beforehand. Any failure aborts the whole transfer; nothing is retried.

use core::fmt::Debug;

use blocklink_hal::{ByteStream, Clock, StreamError};

use crate::block::{block_len, Block, BlockHeader, MAX_BLOCK_SIZE};
use crate::config::LinkConfig;
use crate::error::{LinkError, TransferError};

/// Read exactly `buf.len()` bytes, giving up once the timeout has elapsed
///
/// The stream is polled without blocking; while it has nothing to offer the
/// clock idles for `config.poll_interval_us` between attempts. The deadline
/// covers the whole call, measured on the monotonic clock from entry. A
/// timeout of zero waits forever. Stream errors other than "no data yet" end
/// the read immediately.
pub fn read_exact_timeout<S, C>(
    stream: &mut S,
    clock: &mut C,
    buf: &mut [u8],
    config: &LinkConfig,
) -> Result<(), LinkError<S::Error>>
where
    S: ByteStream + ?Sized,
    S::Error: Debug,
    C: Clock + ?Sized,
{
    let start = clock.now_ms();
    let mut filled = 0;

    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(n) if n > 0 => {
                filled += n;
                continue;
            }
            Ok(_) | Err(StreamError::WouldBlock) => {}
            Err(StreamError::Closed) => {
                log::error!("Failed to read: stream is closed");
                return Err(LinkError::StreamClosed);
            }
            Err(StreamError::Io(e)) => {
                log::error!("Read error: {:?}", e);
                return Err(LinkError::ReadFailed(e));
            }
        }

        if !config.waits_forever() && clock.elapsed_ms(start) >= u64::from(config.timeout_ms) {
            log::warn!(
                "Read timed out after {} ms with {} of {} bytes",
                config.timeout_ms,
                filled,
                buf.len()
            );
            return Err(LinkError::ReadTimeout {
                received: filled,
                expected: buf.len(),
            });
        }

        clock.idle(config.poll_interval_us);
    }

    Ok(())
}

/// Translate a failed write into a transfer error
fn write_error<E: Debug>(e: StreamError<E>, expected: usize) -> LinkError<E> {
    match e {
        StreamError::WouldBlock => {
            log::error!("Write of {} bytes would block", expected);
            LinkError::WriteShort {
                written: 0,
                expected,
            }
        }
        StreamError::Closed => {
            log::error!("Failed to write: stream is closed");
            LinkError::StreamClosed
        }
        StreamError::Io(e) => {
            log::error!("Write error: {:?}", e);
            LinkError::WriteFailed(e)
        }
    }
}

/// Point-to-point block transfer over a byte stream
///
/// Owns the stream and the clock used for read deadlines. One call to
/// [`send`](Self::send) on one side pairs with one call to
/// [`receive`](Self::receive) of the same length on the other.
#[derive(Debug)]
pub struct BlockLink<S, C> {
    stream: S,
    clock: C,
    config: LinkConfig,
}

impl<S, C> BlockLink<S, C>
where
    S: ByteStream,
    S::Error: Debug,
    C: Clock,
{
    /// Create a link with the default configuration (no read timeout)
    pub fn new(stream: S, clock: C) -> Self {
        Self::with_config(stream, clock, LinkConfig::default())
    }

    /// Create a link with an explicit configuration
    pub fn with_config(stream: S, clock: C, config: LinkConfig) -> Self {
        Self {
            stream,
            clock,
            config,
        }
    }

    /// Get a mutable reference to the underlying stream
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the link and return the stream and clock
    pub fn into_parts(self) -> (S, C) {
        (self.stream, self.clock)
    }

    /// Send all of `data`
    ///
    /// Returns `data.len()` once every block has been acknowledged. On
    /// failure the error reports how many bytes were acknowledged (plus any
    /// payload bytes of a block whose write came up short).
    pub fn send(&mut self, data: &[u8]) -> Result<usize, TransferError<S::Error>> {
        log::debug!("Sending {} bytes", data.len());

        let mut pos = 0;
        for (index, chunk) in data.chunks(MAX_BLOCK_SIZE).enumerate() {
            let block = match Block::new(chunk, index == 0) {
                Ok(block) => block,
                Err(e) => return Err(TransferError::new(e.into(), pos)),
            };
            let header = block.header_byte();

            // Header first
            match self.stream.write_byte(header) {
                Ok(true) => {}
                Ok(false) => {
                    log::error!("Failed to write header of block {}", index);
                    return Err(TransferError::new(
                        LinkError::WriteShort {
                            written: 0,
                            expected: 1,
                        },
                        pos,
                    ));
                }
                Err(e) => return Err(TransferError::new(write_error(e, 1), pos)),
            }

            // Then the payload
            let written = self
                .stream
                .write(block.payload())
                .map_err(|e| TransferError::new(write_error(e, block.len()), pos))?;
            if written != block.len() {
                log::error!(
                    "Short payload write in block {}: {} of {} bytes",
                    index,
                    written,
                    block.len()
                );
                return Err(TransferError::new(
                    LinkError::WriteShort {
                        written,
                        expected: block.len(),
                    },
                    pos + written,
                ));
            }

            // Wait for the receiver to echo the header
            let mut ack = [0u8; 1];
            read_exact_timeout(&mut self.stream, &mut self.clock, &mut ack, &self.config)
                .map_err(|e| TransferError::new(e, pos))?;
            if ack[0] != header {
                log::warn!(
                    "The response does not match the block header 0x{:02X} != 0x{:02X}",
                    header,
                    ack[0]
                );
                return Err(TransferError::new(
                    LinkError::AcknowledgmentMismatch {
                        expected: header,
                        received: ack[0],
                    },
                    pos,
                ));
            }

            pos += block.len();
            log::trace!("Block {} acknowledged ({}/{} bytes)", index, pos, data.len());
        }

        log::debug!("Sent {} bytes", pos);
        Ok(pos)
    }

    /// Receive exactly `buf.len()` bytes into `buf`
    ///
    /// Returns `buf.len()` once every block has been verified and
    /// acknowledged. On failure the error reports how many bytes at the front
    /// of `buf` hold acknowledged data.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransferError<S::Error>> {
        let total = buf.len();
        log::debug!("Receiving {} bytes", total);

        let mut pos = 0;
        let mut first = true;
        while pos < total {
            let read = self
                .receive_block(&mut buf[pos..], first)
                .map_err(|e| TransferError::new(e, pos))?;

            pos += read;
            first = false;
            log::trace!("Block received ({}/{} bytes)", pos, total);
        }

        log::debug!("Received {} bytes", pos);
        Ok(pos)
    }

    /// Receive, verify and acknowledge one block into the front of `buf`
    ///
    /// Returns the payload size. `buf` is only written once the block has
    /// passed every check.
    fn receive_block(&mut self, buf: &mut [u8], first: bool) -> Result<usize, LinkError<S::Error>> {
        let expected = block_len(buf.len());

        let mut header_byte = [0u8; 1];
        read_exact_timeout(&mut self.stream, &mut self.clock, &mut header_byte, &self.config)
            .inspect_err(|_| log::warn!("Error reading block header"))?;
        let header_byte = header_byte[0];
        let header = BlockHeader::decode(header_byte);

        if header.is_first != first {
            // The peer is out of step; whatever it queued up belongs to another transfer
            log::warn!(
                "Error block order 0x{:02X}, expected first={}",
                header_byte,
                first
            );
            if let Err(e) = self.stream.discard_input() {
                log::error!("Failed to discard pending input: {:?}", e);
            }
            return Err(LinkError::SequenceMismatch {
                header: header_byte,
                expected_first: first,
            });
        }

        let size = header.size();
        if size > expected {
            log::warn!(
                "Block size {} is larger than the {} bytes left in the buffer",
                size,
                expected
            );
            return Err(LinkError::SizeExceedsBuffer {
                block: size,
                remaining: expected,
            });
        }

        let mut payload = [0u8; MAX_BLOCK_SIZE];
        read_exact_timeout(&mut self.stream, &mut self.clock, &mut payload[..size], &self.config)
            .inspect_err(|_| log::warn!("Error reading {} byte block payload", size))?;

        let block = Block::new(&payload[..size], first)?;
        let computed = block.header_byte();
        if computed != header_byte {
            log::warn!(
                "The block does not match its header 0x{:02X} != 0x{:02X}",
                header_byte,
                computed
            );
            return Err(LinkError::ChecksumMismatch {
                header: header_byte,
                computed,
            });
        }

        match self.stream.write_byte(computed) {
            Ok(true) => {}
            Ok(false) => {
                log::error!("Failed to write acknowledgment");
                return Err(LinkError::WriteShort {
                    written: 0,
                    expected: 1,
                });
            }
            Err(e) => return Err(write_error(e, 1)),
        }

        buf[..size].copy_from_slice(block.payload());
        Ok(size)
    }
}
