//! Blocklink Transfer Protocol
//!
//! This crate moves arbitrary-length buffers between two endpoints joined by
//! a raw byte stream (typically a UART) that has no framing, flow control or
//! error detection of its own.
//!
//! # Protocol Overview
//!
//! A buffer is cut into blocks of at most eight bytes. Each block travels as
//! one header byte followed by its payload:
//! ```text
//! ┌──────────┬───────┬───────────┬───────────────────┐
//! │ CHECKSUM │ FIRST │ SIZE - 1  │ PAYLOAD           │
//! │ 4 bits   │ 1 bit │ 3 bits    │ 1–8B              │
//! └──────────┴───────┴───────────┴───────────────────┘
//! ```
//!
//! The receiver checks the block order, size and CRC-4 checksum, then echoes
//! the header byte back as the acknowledgment. The sender only moves on once
//! the echo matches. The first block of every transfer carries the FIRST flag
//! so that a receiver can tell when the two sides have fallen out of step.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod block;
pub mod config;
pub mod error;
pub mod link;

pub use block::{
    block_count, checksum, encode_header, Block, BlockError, BlockHeader, MAX_BLOCK_SIZE,
    MAX_WIRE_SIZE,
};
pub use config::LinkConfig;
pub use error::{bytes_transferred, LinkError, TransferError};
pub use link::{read_exact_timeout, BlockLink};
