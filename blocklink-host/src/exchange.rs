//! Request/reply exchange over a block link
//!
//! The responder waits for a fixed-length buffer, prints it and answers with
//! every position doubled. The initiator sends positions `0..length` and
//! prints whatever comes back. Both sides must be configured with the same
//! length.

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use blocklink_hal_std::{ByteStream, Clock};
use blocklink_protocol::{bytes_transferred, BlockLink};

use crate::config::Role;

/// Result of one responder round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Buffer received and reply delivered
    Answered,
    /// The receive aborted after this many bytes
    ReceiveFailed(usize),
    /// The reply aborted after this many bytes
    ReplyFailed(usize),
}

/// Request pattern: each byte holds its position
pub fn fill_request(buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = i as u8;
    }
}

/// Reply pattern: each byte holds twice its position
pub fn fill_reply(buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(2);
    }
}

/// Render bytes as comma separated decimals
pub fn format_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{byte}");
    }
    out
}

/// One side of the exchange
pub struct Exchange<S, C> {
    link: BlockLink<S, C>,
    buffer: Vec<u8>,
}

impl<S, C> Exchange<S, C>
where
    S: ByteStream,
    S::Error: StdError + Send + Sync + 'static,
    C: Clock,
{
    /// Exchange `length`-byte buffers over `link`
    pub fn new(link: BlockLink<S, C>, length: usize) -> Self {
        Self {
            link,
            buffer: vec![0; length],
        }
    }

    /// Run `rounds` rounds (0 = forever), pausing between them
    pub fn run(&mut self, role: Role, rounds: u32, pause: Duration) -> Result<()> {
        log::info!(
            "Running as {:?} with {} byte transfers",
            role,
            self.buffer.len()
        );

        let mut round = 0u32;
        while rounds == 0 || round < rounds {
            match role {
                Role::Responder => match self.respond_once() {
                    RoundOutcome::Answered => {}
                    RoundOutcome::ReceiveFailed(n) | RoundOutcome::ReplyFailed(n) => {
                        log::debug!("Round {} stopped after {} bytes", round, n);
                    }
                },
                Role::Initiator => {
                    if let Err(e) = self.initiate_once() {
                        log::warn!("Round {} failed: {:#}", round, e);
                    }
                }
            }

            round += 1;
            if rounds == 0 || round < rounds {
                thread::sleep(pause);
            }
        }
        Ok(())
    }

    /// Wait for one buffer, print it and send the reply
    pub fn respond_once(&mut self) -> RoundOutcome {
        self.buffer.fill(0);

        log::info!("Begin read");
        let received = self.link.receive(&mut self.buffer);
        let count = bytes_transferred(&received);
        if let Err(e) = received {
            if e.error.is_protocol_violation() {
                log::warn!("Peer sent a bad block: {}", e);
            } else {
                log::warn!("Receive failed: {}", e);
            }
            println!("Error read");
            return RoundOutcome::ReceiveFailed(count);
        }
        log::info!("End read ({} bytes)", count);
        println!("{}", format_bytes(&self.buffer));

        fill_reply(&mut self.buffer);

        log::info!("Begin write");
        if let Err(e) = self.link.send(&self.buffer) {
            log::warn!("Reply failed: {}", e);
            return RoundOutcome::ReplyFailed(e.transferred());
        }
        log::info!("End write");
        RoundOutcome::Answered
    }

    /// Send the request pattern and return the reply
    pub fn initiate_once(&mut self) -> Result<&[u8]> {
        fill_request(&mut self.buffer);
        self.link.send(&self.buffer).context("request failed")?;

        self.buffer.fill(0);
        self.link
            .receive(&mut self.buffer)
            .context("reply failed")?;
        println!("{}", format_bytes(&self.buffer));
        Ok(&self.buffer)
    }
}
