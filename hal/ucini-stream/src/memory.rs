//! Memory-block streams
//!
//! Serves configuration text out of caller-provided byte regions: a RAM
//! buffer, a copy of an EEPROM page, a linker-placed flash section. Text ends
//! at the first NUL byte or at the end of the region, whichever comes first.

use heapless::Vec;

use crate::stream::{LineStream, OpenMode, StreamError, StreamSource};

/// Identifier of a memory block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockId(pub u8);

impl BlockId {
    /// Get the id as a byte value
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

/// A bank of memory blocks addressed by [`BlockId`]
///
/// Holds up to `N` regions. The bank borrows the regions; the caller keeps
/// ownership and can inspect them again once the bank is dropped.
pub struct MemoryBlocks<'b, const N: usize> {
    blocks: Vec<(BlockId, &'b mut [u8]), N>,
}

impl<'b, const N: usize> Default for MemoryBlocks<'b, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'b, const N: usize> MemoryBlocks<'b, N> {
    /// Create an empty bank
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Register a region under `id`
    ///
    /// Registering an id twice replaces the earlier region.
    pub fn insert(&mut self, id: BlockId, region: &'b mut [u8]) -> Result<(), StreamError> {
        if let Some(slot) = self.blocks.iter_mut().find(|(bid, _)| *bid == id) {
            slot.1 = region;
            return Ok(());
        }
        self.blocks
            .push((id, region))
            .map_err(|_| StreamError::Full)
    }

    /// Raw contents of a block
    pub fn block(&self, id: BlockId) -> Option<&[u8]> {
        self.blocks
            .iter()
            .find(|(bid, _)| *bid == id)
            .map(|(_, region)| &**region)
    }

    /// Text stored in a block, up to the first NUL
    ///
    /// Returns `None` if the block does not exist or does not hold UTF-8.
    pub fn text(&self, id: BlockId) -> Option<&str> {
        let data = self.block(id)?;
        core::str::from_utf8(&data[..text_len(data)]).ok()
    }
}

impl<'b, const N: usize> StreamSource for MemoryBlocks<'b, N> {
    type Id = BlockId;
    type Stream<'s>
        = MemoryStream<'s>
    where
        Self: 's;

    fn open(&mut self, id: &BlockId, mode: OpenMode) -> Result<MemoryStream<'_>, StreamError> {
        let (_, region) = self
            .blocks
            .iter_mut()
            .find(|(bid, _)| bid == id)
            .ok_or(StreamError::NotFound)?;
        Ok(MemoryStream::new(region, mode))
    }
}

/// Length of the text in `data`: up to the first NUL or the whole region
fn text_len(data: &[u8]) -> usize {
    data.iter().position(|&b| b == 0).unwrap_or(data.len())
}

/// Stream over a single memory region
#[derive(Debug)]
pub struct MemoryStream<'b> {
    data: &'b mut [u8],
    pos: usize,
    end: usize,
    mode: OpenMode,
    closed: bool,
}

impl<'b> MemoryStream<'b> {
    /// Open a stream directly on a region
    ///
    /// Opening for write discards the previous text, like `fopen(.., "w")`.
    pub fn new(data: &'b mut [u8], mode: OpenMode) -> Self {
        let end = match mode {
            OpenMode::Read => text_len(data),
            OpenMode::Write => {
                if let Some(first) = data.first_mut() {
                    *first = 0;
                }
                0
            }
        };
        Self {
            data,
            pos: 0,
            end,
            mode,
            closed: false,
        }
    }

    /// Number of bytes consumed (read mode) or produced (write mode)
    pub fn position(&self) -> usize {
        self.pos
    }

    fn check(&self, mode: OpenMode) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if self.mode != mode {
            return Err(StreamError::WrongMode);
        }
        Ok(())
    }
}

impl<'b> LineStream for MemoryStream<'b> {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, StreamError> {
        self.check(OpenMode::Read)?;
        if self.pos >= self.end {
            return Ok(None);
        }

        let rest = &self.data[self.pos..self.end];
        let line_len = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |nl| nl + 1);

        // Overlong lines are clipped, the tail is dropped
        let n = line_len.min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += line_len;
        Ok(Some(n))
    }

    fn write_line(&mut self, line: &str) -> Result<(), StreamError> {
        self.check(OpenMode::Write)?;
        let bytes = line.as_bytes();
        let end = self.pos + bytes.len();
        if end > self.data.len() {
            return Err(StreamError::Full);
        }

        self.data[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        if let Some(terminator) = self.data.get_mut(end) {
            *terminator = 0;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.closed = true;
        Ok(())
    }
}
