//! Serial device access for unix hosts
//!
//! Opens a tty in non-blocking mode without making it the controlling
//! terminal. Line settings (baud rate, character size, raw mode) are left as
//! they are: configure the port beforehand, e.g. with `stty raw`. The port
//! must keep a non-zero `min` so that an idle line reports `EAGAIN`; a
//! zero-byte read is taken as a hang-up.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use blocklink_hal::{ByteStream, StreamError};

use crate::io::{classify, drain, read_handle};

/// An opened serial device
///
/// The port is closed when the value is dropped.
#[derive(Debug)]
pub struct SerialDevice {
    path: PathBuf,
    file: File,
}

impl SerialDevice {
    /// Open `path` for non-blocking reads and writes
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)?;

        log::info!("Opened serial device {}", path.display());

        let mut device = Self { path, file };
        // Stale bytes from before we opened the port would desync the first block
        match device.flush_input() {
            Err(e) if e.raw_os_error() != Some(libc::ENOTTY) => Err(e),
            _ => Ok(device),
        }
    }

    /// Drop everything in the kernel receive queue
    fn flush_input(&mut self) -> io::Result<()> {
        // SAFETY: the descriptor is owned by `self.file` and stays open for
        // the duration of the call.
        #[allow(unsafe_code)]
        let ret = unsafe { libc::tcflush(self.file.as_raw_fd(), libc::TCIFLUSH) };
        if ret == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

impl ByteStream for SerialDevice {
    type Error = io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, StreamError<io::Error>> {
        self.file.write(data).map_err(classify)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError<io::Error>> {
        read_handle(&mut self.file, buf)
    }

    fn discard_input(&mut self) -> Result<(), StreamError<io::Error>> {
        match self.flush_input() {
            Ok(()) => Ok(()),
            // Not a terminal (e.g. a FIFO): fall back to reading it empty
            Err(e) if e.raw_os_error() == Some(libc::ENOTTY) => drain(&mut self.file),
            Err(e) => Err(classify(e)),
        }
    }
}

impl Drop for SerialDevice {
    fn drop(&mut self) {
        if let Err(e) = self.flush_input() {
            log::debug!("Flush on close of {} failed: {}", self.path.display(), e);
        }
        log::info!("Closed serial device {}", self.path.display());
    }
}
