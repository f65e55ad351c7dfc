//! In-memory duplex pipe
//!
//! [`pair`] returns two connected ends: bytes written to one end become
//! readable at the other. Reads on an empty pipe report
//! [`StreamError::WouldBlock`], matching a non-blocking serial port. Once the
//! peer end is dropped and its bytes are consumed, reads report
//! [`StreamError::Closed`].

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use blocklink_hal::{ByteStream, StreamError};

/// One end of an in-memory pipe
#[derive(Debug)]
pub struct LoopbackEnd {
    tx: Sender<u8>,
    rx: Receiver<u8>,
}

/// Create two connected pipe ends
pub fn pair() -> (LoopbackEnd, LoopbackEnd) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();
    (
        LoopbackEnd { tx: a_tx, rx: a_rx },
        LoopbackEnd { tx: b_tx, rx: b_rx },
    )
}

impl ByteStream for LoopbackEnd {
    type Error = io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError<io::Error>> {
        for &byte in data {
            self.tx.send(byte).map_err(|_| StreamError::Closed)?;
        }
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError<io::Error>> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.try_recv() {
                Ok(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if n == 0 => return Err(StreamError::Closed),
                Err(TryRecvError::Disconnected) => break,
            }
        }
        if n == 0 {
            return Err(StreamError::WouldBlock);
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> Result<(), StreamError<io::Error>> {
        while self.rx.try_recv().is_ok() {}
        Ok(())
    }
}
