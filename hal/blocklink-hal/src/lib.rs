//! Blocklink Hardware Abstraction Layer
//!
//! This crate defines the traits the block transfer protocol needs from the
//! platform underneath it. A serial port, a socket or an in-memory pipe can
//! all carry blocklink transfers once they implement these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  blocklink-protocol (block transfers)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  blocklink-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ blocklink-hal-│       │  board HALs   │
//! │      std      │       │ (no_std UART) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`stream::ByteStream`] - Non-blocking duplex byte channel
//! - [`clock::Clock`] - Monotonic millisecond time source

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod stream;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use stream::{ByteStream, StreamError};
