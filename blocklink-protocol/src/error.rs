//! Transfer errors
//!
//! Every error aborts the whole transfer. [`TransferError`] pairs the cause
//! with how many bytes made it across before the abort, so callers can tell
//! both what went wrong and how far the transfer got.

use core::fmt;

use crate::block::BlockError;

/// Reason a transfer was aborted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError<E> {
    /// The stream was closed underneath the transfer
    StreamClosed,
    /// The stream accepted fewer bytes than requested
    WriteShort { written: usize, expected: usize },
    /// The stream reported a write error
    WriteFailed(E),
    /// Nothing (or not enough) arrived before the deadline
    ReadTimeout { received: usize, expected: usize },
    /// The stream reported a read error
    ReadFailed(E),
    /// The payload does not match the checksum in its header
    ChecksumMismatch { header: u8, computed: u8 },
    /// The peer announced a block larger than the space left in the buffer
    SizeExceedsBuffer { block: usize, remaining: usize },
    /// The first-block flag is not what this side expected
    SequenceMismatch { header: u8, expected_first: bool },
    /// The peer echoed a different header than the one sent
    AcknowledgmentMismatch { expected: u8, received: u8 },
    /// A block could not be built from the payload
    InvalidBlock(BlockError),
}

impl<E> LinkError<E> {
    /// Check if the transfer stopped waiting for the peer
    pub fn is_timeout(&self) -> bool {
        matches!(self, LinkError::ReadTimeout { .. })
    }

    /// Check if the peer sent data that failed validation
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            LinkError::ChecksumMismatch { .. }
                | LinkError::SizeExceedsBuffer { .. }
                | LinkError::SequenceMismatch { .. }
                | LinkError::AcknowledgmentMismatch { .. }
        )
    }
}

impl<E> From<BlockError> for LinkError<E> {
    fn from(e: BlockError) -> Self {
        LinkError::InvalidBlock(e)
    }
}

impl<E: fmt::Display> fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::StreamClosed => f.write_str("stream closed"),
            LinkError::WriteShort { written, expected } => {
                write!(f, "short write: {written} of {expected} bytes")
            }
            LinkError::WriteFailed(e) => write!(f, "write failed: {e}"),
            LinkError::ReadTimeout { received, expected } => {
                write!(f, "read timed out after {received} of {expected} bytes")
            }
            LinkError::ReadFailed(e) => write!(f, "read failed: {e}"),
            LinkError::ChecksumMismatch { header, computed } => write!(
                f,
                "block does not match its header: 0x{header:02X} != 0x{computed:02X}"
            ),
            LinkError::SizeExceedsBuffer { block, remaining } => write!(
                f,
                "block size {block} is larger than the {remaining} bytes left in the buffer"
            ),
            LinkError::SequenceMismatch {
                header,
                expected_first,
            } => write!(
                f,
                "unexpected block order: header 0x{header:02X}, expected first={expected_first}"
            ),
            LinkError::AcknowledgmentMismatch { expected, received } => write!(
                f,
                "acknowledgment does not match the block header: 0x{expected:02X} != 0x{received:02X}"
            ),
            LinkError::InvalidBlock(e) => write!(f, "invalid block: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for LinkError<E> {}

/// An aborted transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferError<E> {
    /// Why the transfer stopped
    pub error: LinkError<E>,
    /// Bytes moved before the abort
    pub transferred: usize,
}

impl<E> TransferError<E> {
    pub(crate) fn new(error: LinkError<E>, transferred: usize) -> Self {
        Self { error, transferred }
    }

    /// Bytes moved before the abort
    ///
    /// This is the count a plain "bytes transferred" interface would report.
    pub fn transferred(&self) -> usize {
        self.transferred
    }
}

impl<E: fmt::Display> fmt::Display for TransferError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transfer aborted after {} bytes: {}",
            self.transferred, self.error
        )
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for TransferError<E> {}

/// Collapse a transfer result into a plain byte count
///
/// For callers that only care how far the transfer got.
pub fn bytes_transferred<E>(result: &Result<usize, TransferError<E>>) -> usize {
    match result {
        Ok(n) => *n,
        Err(e) => e.transferred,
    }
}
