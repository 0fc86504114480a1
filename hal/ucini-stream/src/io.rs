//! `embedded-io` adapter
//!
//! Wraps any blocking `embedded_io` reader/writer (a UART, a flash file from
//! an embedded filesystem, a host-side byte slice) as a [`LineStream`].

use embedded_io::{Read, Write};

use crate::stream::{LineStream, StreamError};

/// Line stream over an `embedded_io` device
///
/// Lines are read one byte at a time until `\n` so nothing past the current
/// line is consumed from the device.
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
    closed: bool,
}

impl<T> IoStream<T> {
    /// Wrap a device
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    /// Reclaim the device
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn check_open(&self) -> Result<(), StreamError> {
        if self.closed {
            Err(StreamError::Closed)
        } else {
            Ok(())
        }
    }
}

impl<T: Read> IoStream<T> {
    /// Read a single byte, `None` at end of input
    fn read_byte(&mut self) -> Result<Option<u8>, StreamError> {
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(_) => Err(StreamError::Io),
        }
    }
}

impl<T: Read + Write> LineStream for IoStream<T> {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StreamError> {
        self.check_open()?;

        let mut len = 0;
        let mut seen = false;
        while let Some(byte) = self.read_byte()? {
            seen = true;
            // Overlong lines are clipped, the tail is dropped
            if len < buf.len() {
                buf[len] = byte;
                len += 1;
            }
            if byte == b'\n' {
                break;
            }
        }

        Ok(seen.then_some(len))
    }

    fn write_line(&mut self, line: &str) -> Result<(), StreamError> {
        self.check_open()?;
        self.inner
            .write_all(line.as_bytes())
            .map_err(|_| StreamError::Io)
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.check_open()?;
        self.closed = true;
        self.inner.flush().map_err(|_| StreamError::Io)
    }
}
