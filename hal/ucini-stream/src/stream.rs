//! Line stream abstractions
//!
//! Provides the traits the marshalling engine uses to read and write
//! configuration text one line at a time. Implementations decide what an
//! identifier means: a file name, a memory block number, an EEPROM page.

/// Direction a stream is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Lines are read from the stream (parse)
    Read,
    /// Lines are written to the stream (dump)
    Write,
}

/// Errors from stream operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamError {
    /// No stream exists for the identifier
    NotFound,
    /// Underlying device failed
    Io,
    /// No room left for the line being written
    Full,
    /// Operation does not match the mode the stream was opened in
    WrongMode,
    /// Stream was already closed
    Closed,
}

/// A line-oriented stream
///
/// Lines handed to [`write_line`](LineStream::write_line) already carry their
/// terminator; the stream stores them verbatim.
pub trait LineStream {
    /// Read the next line into `buf`
    ///
    /// The line terminator, if present, is kept. A line longer than `buf` is
    /// truncated to `buf.len()` bytes and the remainder is discarded.
    ///
    /// # Returns
    /// `Ok(Some(len))` with the number of bytes stored, `Ok(None)` at the end
    /// of the stream, or an error.
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StreamError>;

    /// Write one line
    fn write_line(&mut self, line: &str) -> Result<(), StreamError>;

    /// Close the stream
    ///
    /// Further reads and writes fail with [`StreamError::Closed`].
    fn close(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

impl<S: LineStream + ?Sized> LineStream for &mut S {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StreamError> {
        (**self).read_line(buf)
    }

    fn write_line(&mut self, line: &str) -> Result<(), StreamError> {
        (**self).write_line(line)
    }

    fn close(&mut self) -> Result<(), StreamError> {
        (**self).close()
    }
}

/// Something that can open line streams by identifier
pub trait StreamSource {
    /// Identifier type (file name, block number, ...)
    type Id: ?Sized;

    /// Stream handle returned by [`open`](StreamSource::open)
    type Stream<'s>: LineStream
    where
        Self: 's;

    /// Open the stream named by `id`
    ///
    /// # Arguments
    /// * `id` - Identifier meaningful to the platform
    /// * `mode` - Read for parsing, write for dumping
    fn open(&mut self, id: &Self::Id, mode: OpenMode) -> Result<Self::Stream<'_>, StreamError>;
}
