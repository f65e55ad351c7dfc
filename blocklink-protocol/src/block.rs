//! Block encoding and decoding.
//!
//! Block format on the wire:
//! - HEADER (1 byte): CHECKSUM (bits 7-4), FIRST flag (bit 3), SIZE-1 (bits 2-0)
//! - PAYLOAD (1-8 bytes): raw data
//!
//! The receiver acknowledges a block by echoing its header byte unchanged.

use core::fmt;

use heapless::Vec;

/// Largest payload a single block carries
pub const MAX_BLOCK_SIZE: usize = 8;

/// Largest block on the wire (HEADER + MAX_BLOCK_SIZE)
pub const MAX_WIRE_SIZE: usize = 1 + MAX_BLOCK_SIZE;

/// Generator polynomial for the header checksum (x^4 + x + 1)
pub const CRC4_POLY: u8 = 0x13;

/// Header bit set on the first block of a transfer
const FIRST_FLAG: u8 = 0x08;

/// Header bits holding the payload size minus one
const SIZE_MASK: u8 = 0x07;

/// Errors from building a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockError {
    /// Payload has no bytes
    Empty,
    /// Payload is longer than [`MAX_BLOCK_SIZE`]
    TooLarge(usize),
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::Empty => f.write_str("block payload cannot be empty"),
            BlockError::TooLarge(size) => write!(
                f,
                "block payload of {size} bytes exceeds the {MAX_BLOCK_SIZE} byte limit"
            ),
            BlockError::BufferTooSmall => f.write_str("buffer too small for block"),
        }
    }
}

impl core::error::Error for BlockError {}

/// Compute the 4-bit CRC of a payload
///
/// Bits are shifted in MSB first, starting from zero, with no final XOR.
pub fn checksum(payload: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in payload {
        for bit in (0..8).rev() {
            let data_bit = (byte >> bit) & 1 != 0;
            let crc_msb = crc & 0x08 != 0;
            crc <<= 1;
            if crc_msb ^ data_bit {
                crc ^= CRC4_POLY;
            }
            crc &= 0x0F;
        }
    }
    crc
}

/// Build the header byte for a payload
pub fn encode_header(payload: &[u8], is_first: bool) -> Result<u8, BlockError> {
    BlockHeader::for_payload(payload, is_first).map(|header| header.encode())
}

/// Size of the next block when `remaining` bytes are left to move
pub fn block_len(remaining: usize) -> usize {
    remaining.min(MAX_BLOCK_SIZE)
}

/// Number of blocks a transfer of `total` bytes is cut into
pub fn block_count(total: usize) -> usize {
    total.div_ceil(MAX_BLOCK_SIZE)
}

/// Unpacked header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockHeader {
    /// 4-bit payload checksum
    pub checksum: u8,
    /// Set on the first block of a transfer
    pub is_first: bool,
    /// Payload size minus one (3 bits)
    pub size_code: u8,
}

impl BlockHeader {
    /// Compute the header describing `payload`
    pub fn for_payload(payload: &[u8], is_first: bool) -> Result<Self, BlockError> {
        match payload.len() {
            0 => Err(BlockError::Empty),
            len if len > MAX_BLOCK_SIZE => Err(BlockError::TooLarge(len)),
            len => Ok(Self {
                checksum: checksum(payload),
                is_first,
                size_code: (len - 1) as u8,
            }),
        }
    }

    /// Split a header byte into its fields
    ///
    /// Always succeeds. The checksum still has to be checked against the
    /// payload that follows.
    pub fn decode(byte: u8) -> Self {
        Self {
            checksum: byte >> 4,
            is_first: byte & FIRST_FLAG != 0,
            size_code: byte & SIZE_MASK,
        }
    }

    /// Pack the fields back into a header byte
    pub fn encode(&self) -> u8 {
        let first = if self.is_first { FIRST_FLAG } else { 0 };
        ((self.checksum & 0x0F) << 4) | first | (self.size_code & SIZE_MASK)
    }

    /// Payload length announced by this header (1-8)
    pub fn size(&self) -> usize {
        (self.size_code & SIZE_MASK) as usize + 1
    }
}

/// One block of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    payload: Vec<u8, MAX_BLOCK_SIZE>,
    is_first: bool,
}

impl Block {
    /// Create a block carrying `payload`
    pub fn new(payload: &[u8], is_first: bool) -> Result<Self, BlockError> {
        if payload.is_empty() {
            return Err(BlockError::Empty);
        }

        let payload = Vec::from_slice(payload).map_err(|_| BlockError::TooLarge(payload.len()))?;
        Ok(Self { payload, is_first })
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length (1-8)
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Always false: blocks carry at least one byte
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether this block starts a transfer
    pub fn is_first(&self) -> bool {
        self.is_first
    }

    /// Header fields for this block
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            checksum: checksum(&self.payload),
            is_first: self.is_first,
            size_code: (self.payload.len() - 1) as u8,
        }
    }

    /// Header byte for this block, which is also its acknowledgment
    pub fn header_byte(&self) -> u8 {
        self.header().encode()
    }

    /// Encode this block into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, BlockError> {
        let wire_len = 1 + self.payload.len();
        if buffer.len() < wire_len {
            return Err(BlockError::BufferTooSmall);
        }

        buffer[0] = self.header_byte();
        buffer[1..wire_len].copy_from_slice(&self.payload);
        Ok(wire_len)
    }

    /// Encode this block into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_WIRE_SIZE>, BlockError> {
        let mut buffer = [0u8; MAX_WIRE_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| BlockError::BufferTooSmall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_vectors() {
        assert_eq!(checksum(&[0x00]), 0x0);
        assert_eq!(checksum(&[0x01]), 0x3);
        assert_eq!(checksum(&[0xFF]), 0x4);
        assert_eq!(checksum(&[0, 1, 2, 3, 4, 5, 6, 7]), 0xC);
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(checksum(&payload), checksum(&payload));
    }

    #[test]
    fn test_checksum_detects_single_bit_flip() {
        let payload = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        let original = checksum(&payload);
        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut flipped = payload;
                flipped[byte] ^= 1 << bit;
                assert_ne!(checksum(&flipped), original, "byte {byte} bit {bit}");
            }
        }
    }

    #[test]
    fn test_encode_header_layout() {
        assert_eq!(encode_header(&[0x01], true), Ok(0x38));
        assert_eq!(encode_header(&[0xAA, 0x55], false), Ok(0x61));
        assert_eq!(encode_header(&[0, 1, 2, 3, 4, 5, 6, 7], true), Ok(0xCF));
    }

    #[test]
    fn test_encode_header_rejects_bad_sizes() {
        assert_eq!(encode_header(&[], true), Err(BlockError::Empty));
        assert_eq!(encode_header(&[0u8; 9], false), Err(BlockError::TooLarge(9)));
    }

    #[test]
    fn test_decode_header() {
        let header = BlockHeader::decode(0xCF);
        assert_eq!(header.checksum, 0xC);
        assert!(header.is_first);
        assert_eq!(header.size_code, 7);
        assert_eq!(header.size(), 8);
        assert_eq!(header.encode(), 0xCF);
    }

    #[test]
    fn test_block_encode() {
        let block = Block::new(&[0xAA, 0x55], false).unwrap();
        let mut buffer = [0u8; MAX_WIRE_SIZE];
        let len = block.encode(&mut buffer).unwrap();

        assert_eq!(len, 3);
        assert_eq!(&buffer[..3], &[0x61, 0xAA, 0x55]);
        assert_eq!(block.encode_to_vec().unwrap().as_slice(), &buffer[..3]);
    }

    #[test]
    fn test_full_block_encode_to_vec() {
        let payload = [0, 1, 2, 3, 4, 5, 6, 7];
        let block = Block::new(&payload, true).unwrap();

        let wire = block.encode_to_vec().unwrap();
        assert_eq!(wire.len(), MAX_WIRE_SIZE);
        assert_eq!(wire[0], 0xCF);
        assert_eq!(&wire[1..], &payload);
    }

    #[test]
    fn test_block_encode_buffer_too_small() {
        let block = Block::new(&[1, 2, 3], true).unwrap();
        let mut buffer = [0u8; 3];
        assert_eq!(block.encode(&mut buffer), Err(BlockError::BufferTooSmall));
    }

    #[test]
    fn test_block_rejects_bad_sizes() {
        assert_eq!(Block::new(&[], true), Err(BlockError::Empty));
        assert_eq!(Block::new(&[0u8; 12], true), Err(BlockError::TooLarge(12)));
    }

    #[test]
    fn test_block_count() {
        assert_eq!(block_count(0), 0);
        assert_eq!(block_count(1), 1);
        assert_eq!(block_count(8), 1);
        assert_eq!(block_count(9), 2);
        assert_eq!(block_count(40), 5);
    }

    proptest! {
        #[test]
        fn prop_header_roundtrip(
            payload in proptest::collection::vec(any::<u8>(), 1..=MAX_BLOCK_SIZE),
            is_first in any::<bool>(),
        ) {
            let byte = encode_header(&payload, is_first).unwrap();
            let header = BlockHeader::decode(byte);

            prop_assert_eq!(header.size_code as usize, payload.len() - 1);
            prop_assert_eq!(header.is_first, is_first);
            prop_assert_eq!(header.checksum, checksum(&payload));
            prop_assert_eq!(header.encode(), byte);
        }

        #[test]
        fn prop_block_header_matches_encode_header(
            payload in proptest::collection::vec(any::<u8>(), 1..=MAX_BLOCK_SIZE),
            is_first in any::<bool>(),
        ) {
            let block = Block::new(&payload, is_first).unwrap();
            prop_assert_eq!(Ok(block.header_byte()), encode_header(&payload, is_first));
        }
    }
}
