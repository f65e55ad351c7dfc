//! Integration test: run a sender and a receiver on two threads joined by an
//! in-memory pipe and check that buffers arrive intact.

use std::io::Cursor;
use std::thread;
use std::time::{Duration, Instant};

use blocklink_hal_std::loopback::{self, LoopbackEnd};
use blocklink_hal_std::{ByteStream, IoStream, StdClock, StreamError};
use blocklink_protocol::{BlockLink, LinkConfig, LinkError};

const TIMEOUT_MS: u32 = 2_000;

fn new_link<S>(stream: S) -> BlockLink<S, StdClock>
where
    S: ByteStream,
    S::Error: std::fmt::Debug,
{
    BlockLink::with_config(stream, StdClock::new(), LinkConfig::with_timeout_ms(TIMEOUT_MS))
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Send `data` from one end and receive it on the other
fn transfer(data: Vec<u8>) -> (Result<usize, String>, Result<Vec<u8>, String>) {
    let (a, b) = loopback::pair();
    let len = data.len();

    let sender = thread::spawn(move || {
        let mut link = new_link(a);
        link.send(&data).map_err(|e| e.to_string())
    });

    let receiver = thread::spawn(move || {
        let mut link = new_link(b);
        let mut buf = vec![0u8; len];
        match link.receive(&mut buf) {
            Ok(_) => Ok(buf),
            Err(e) => Err(e.to_string()),
        }
    });

    (sender.join().unwrap(), receiver.join().unwrap())
}

#[test]
fn loopback_forty_bytes() {
    let _ = env_logger::try_init();

    let data: Vec<u8> = (0..40).collect();
    let (sent, received) = transfer(data.clone());

    assert_eq!(sent, Ok(40));
    assert_eq!(received, Ok(data));
}

#[test]
fn loopback_every_length_up_to_70() {
    let _ = env_logger::try_init();

    for len in 1..=70 {
        let data = pattern(len);
        let (sent, received) = transfer(data.clone());
        assert_eq!(sent, Ok(len), "send of {len} bytes");
        assert_eq!(received, Ok(data), "receive of {len} bytes");
    }
}

#[test]
fn loopback_large_buffer() {
    let _ = env_logger::try_init();

    let data = pattern(4096 + 3);
    let (sent, received) = transfer(data.clone());

    assert_eq!(sent, Ok(data.len()));
    assert_eq!(received, Ok(data));
}

#[test]
fn loopback_request_and_reply() {
    let _ = env_logger::try_init();

    let (a, b) = loopback::pair();

    let responder = thread::spawn(move || {
        let mut link = new_link(b);
        let mut buf = [0u8; 40];
        link.receive(&mut buf).unwrap();
        let reply: Vec<u8> = buf.iter().map(|&b| b.wrapping_mul(2)).collect();
        link.send(&reply).unwrap();
    });

    let mut link = new_link(a);
    let request: Vec<u8> = (0..40).collect();
    assert_eq!(link.send(&request).unwrap(), 40);

    let mut reply = [0u8; 40];
    assert_eq!(link.receive(&mut reply).unwrap(), 40);
    let expected: Vec<u8> = (0..40).map(|i| i * 2).collect();
    assert_eq!(&reply[..], &expected[..]);

    responder.join().unwrap();
}

#[test]
fn receive_times_out_on_silent_stream() {
    let (a, _b) = loopback::pair();
    let mut link = BlockLink::with_config(a, StdClock::new(), LinkConfig::with_timeout_ms(200));

    let started = Instant::now();
    let mut buf = [0u8; 16];
    let err = link.receive(&mut buf).unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.error.is_timeout());
    assert_eq!(err.transferred, 0);
    assert!(elapsed >= Duration::from_millis(200), "gave up early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(700), "gave up late: {elapsed:?}");
}

#[test]
fn receive_reports_closed_peer() {
    let (a, b) = loopback::pair();
    drop(b);

    let mut link = new_link(a);
    let mut buf = [0u8; 4];
    let err = link.receive(&mut buf).unwrap_err();
    assert!(matches!(err.error, LinkError::StreamClosed));
}

#[test]
fn receive_reports_end_of_file_without_waiting() {
    // No timeout: an end of file must still end the wait
    let stream = IoStream::new(Cursor::new(Vec::<u8>::new()));
    let mut link = BlockLink::new(stream, StdClock::new());

    let mut buf = [0u8; 8];
    let err = link.receive(&mut buf).unwrap_err();
    assert!(matches!(err.error, LinkError::StreamClosed));
    assert_eq!(err.transferred, 0);
}

/// Pipe end that flips one bit of the byte at `offset` in its outgoing stream
struct Corrupting {
    inner: LoopbackEnd,
    offset: usize,
    mask: u8,
    written: usize,
}

impl ByteStream for Corrupting {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError<std::io::Error>> {
        let mut data = data.to_vec();
        for (i, byte) in data.iter_mut().enumerate() {
            if self.written + i == self.offset {
                *byte ^= self.mask;
            }
        }
        let n = self.inner.write(&data)?;
        self.written += n;
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError<std::io::Error>> {
        self.inner.read(buf)
    }

    fn discard_input(&mut self) -> Result<(), StreamError<std::io::Error>> {
        self.inner.discard_input()
    }
}

#[test]
fn corrupted_payload_aborts_both_sides() {
    let _ = env_logger::try_init();

    let (a, b) = loopback::pair();
    // Byte 21 on the wire is the third payload byte of the third block
    let stream = Corrupting {
        inner: a,
        offset: 21,
        mask: 0x01,
        written: 0,
    };

    let sender = thread::spawn(move || {
        let config = LinkConfig::with_timeout_ms(300);
        let mut link = BlockLink::with_config(stream, StdClock::new(), config);
        link.send(&pattern(40))
    });

    let mut link = new_link(b);
    let mut buf = [0u8; 40];
    let err = link.receive(&mut buf).unwrap_err();
    assert!(matches!(err.error, LinkError::ChecksumMismatch { .. }));
    assert_eq!(err.transferred, 16);

    // No acknowledgment for the damaged block: the sender times out
    let err = sender.join().unwrap().unwrap_err();
    assert!(err.error.is_timeout());
    assert_eq!(err.transferred, 16);
}
