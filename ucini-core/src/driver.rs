//! Parse and dump drivers
//!
//! Parsing is a two-state machine over input lines:
//!
//! ```text
//!            [known]                 [unknown]
//! NoSection ─────────▶ InSection ─────────────▶ NoSection
//!                      │      ▲
//!                      └──────┘ key=value applied to the section's fields
//! ```
//!
//! Nothing in the marshalling logic aborts a parse. Unknown names, bad values
//! and malformed lines are skipped, and the returned count tells the caller
//! how much was applied.

use ucini_stream::{LineStream, OpenMode, StreamError, StreamSource};

use crate::line::{tokenize_line, Line, LineBuffer};
use crate::options::{Options, MAX_LINE_LENGTH};
use crate::schema::{Hint, Schema, Section};

/// Dump aborted by a stream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DumpError {
    /// Error reported by the stream layer
    pub stream: StreamError,
    /// Entries written before the failure
    pub written: usize,
}

#[derive(Debug, Clone, Copy)]
enum ParseState<'s> {
    /// Outside any known section, entries are ignored
    NoSection,
    /// Inside a known section
    InSection(&'s Section<'s>),
}

/// Line-by-line parse state for one pass over a file
///
/// Holds the current section and the round-robin hints. Drop it at the end
/// of the pass; nothing carries over to the next one.
#[derive(Debug)]
pub struct ParseCursor<'s> {
    schema: &'s Schema<'s>,
    state: ParseState<'s>,
    section_hint: Hint,
    entry_hint: Hint,
    count: usize,
}

impl<'s> ParseCursor<'s> {
    /// Start a pass outside any section
    pub fn new(schema: &'s Schema<'s>) -> Self {
        Self {
            schema,
            state: ParseState::NoSection,
            section_hint: Hint::default(),
            entry_hint: Hint::default(),
            count: 0,
        }
    }

    /// Values applied so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// Name of the section entries are currently applied to
    pub fn section(&self) -> Option<&'s str> {
        match self.state {
            ParseState::NoSection => None,
            ParseState::InSection(section) => Some(section.name),
        }
    }

    /// Feed one line
    ///
    /// Returns `true` if the line assigned a value.
    pub fn feed(&mut self, line: &str) -> bool {
        match tokenize_line(line) {
            Line::Section(name) => {
                self.enter(name);
                false
            }
            Line::Entry { key, value } => self.apply(key, value),
            Line::Ignored => false,
        }
    }

    fn enter(&mut self, name: &str) {
        let sections = self.schema.sections;
        self.state = match self.schema.find_section(name, &mut self.section_hint) {
            Some(index) => {
                trace!("[{}] matched", name);
                self.entry_hint = Hint::default();
                ParseState::InSection(&sections[index])
            }
            None => {
                debug!("[{}] not in schema, skipping", name);
                ParseState::NoSection
            }
        };
    }

    fn apply(&mut self, key: &str, value: &str) -> bool {
        let ParseState::InSection(section) = self.state else {
            return false;
        };
        let Some(index) = section.find_entry(key, &mut self.entry_hint) else {
            trace!("{}: not in [{}]", key, section.name);
            return false;
        };

        match section.entries[index].field.assign(value) {
            Ok(()) => {
                self.count += 1;
                true
            }
            Err(e) => {
                warn!("[{}] {}: value rejected: {}", section.name, key, e);
                false
            }
        }
    }
}

/// Parse lines from an open stream into the schema's fields
///
/// Reads until end of stream. A read error ends the pass like end of stream
/// does. The stream is left open.
///
/// # Returns
/// The number of values applied.
pub fn parse_stream<L>(schema: &Schema<'_>, stream: &mut L) -> usize
where
    L: LineStream + ?Sized,
{
    let mut cursor = ParseCursor::new(schema);
    let mut buf = [0u8; MAX_LINE_LENGTH];

    loop {
        let len = match stream.read_line(&mut buf) {
            Ok(Some(len)) => len,
            Ok(None) => break,
            Err(e) => {
                warn!("Read failed: {}, treating as end of input", e);
                break;
            }
        };

        let bytes = &buf[..len];
        let line = match core::str::from_utf8(bytes) {
            Ok(line) => line,
            // A clipped line may end inside a multi-byte character
            Err(e) if e.error_len().is_none() && len == buf.len() => {
                core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or("")
            }
            Err(e) => {
                warn!("Invalid UTF-8 at byte {}, line skipped", e.valid_up_to());
                continue;
            }
        };
        cursor.feed(line);
    }

    debug!("Parsed {} values", cursor.count());
    cursor.count()
}

/// Open `id` on `source` and parse it
///
/// The stream is closed on every exit path.
///
/// # Returns
/// The number of values applied, or the error from opening the stream.
pub fn parse<S: StreamSource>(
    schema: &Schema<'_>,
    source: &mut S,
    id: &S::Id,
) -> Result<usize, StreamError> {
    let mut stream = match source.open(id, OpenMode::Read) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Open for read failed: {}", e);
            return Err(e);
        }
    };

    let count = parse_stream(schema, &mut stream);
    if let Err(e) = stream.close() {
        warn!("Close failed: {}", e);
    }
    Ok(count)
}

/// Write every section and entry of the schema to an open stream
///
/// Output follows declaration order exactly, one line per section header
/// and per entry. An entry whose value cannot be formatted (a busy text
/// field, a failing callback) is left out. The stream is left open.
///
/// # Returns
/// The number of entries written, or the first stream error.
pub fn dump_stream<L>(
    schema: &Schema<'_>,
    stream: &mut L,
    options: &Options,
) -> Result<usize, DumpError>
where
    L: LineStream + ?Sized,
{
    let mut line = LineBuffer::new();
    let mut written = 0;

    for section in schema.sections {
        line.clear();
        line.push_str("[");
        line.push_str(section.name);
        line.push_str("]");
        line.terminate();
        if line.is_truncated() {
            warn!("[{}]: line truncated", section.name);
        }
        stream
            .write_line(line.as_str())
            .map_err(|stream| DumpError { stream, written })?;

        for entry in section.entries {
            line.clear();
            line.push_str(entry.name);
            line.push_str("=");
            if let Err(e) = entry.field.format(&mut line, options) {
                warn!("[{}] {}: not dumped: {}", section.name, entry.name, e);
                continue;
            }
            line.terminate();
            if line.is_truncated() {
                warn!("[{}] {}: line truncated", section.name, entry.name);
            }

            stream
                .write_line(line.as_str())
                .map_err(|stream| DumpError { stream, written })?;
            written += 1;
        }
    }

    debug!("Dumped {} values", written);
    Ok(written)
}

/// Open `id` on `source` for writing and dump the schema with default options
pub fn dump<S: StreamSource>(
    schema: &Schema<'_>,
    source: &mut S,
    id: &S::Id,
) -> Result<usize, DumpError> {
    dump_with_options(schema, source, id, &Options::default())
}

/// Open `id` on `source` for writing and dump the schema
///
/// The stream is closed on every exit path. A failing close (an unflushed
/// device) is reported like a failing write.
pub fn dump_with_options<S: StreamSource>(
    schema: &Schema<'_>,
    source: &mut S,
    id: &S::Id,
    options: &Options,
) -> Result<usize, DumpError> {
    let mut stream = source.open(id, OpenMode::Write).map_err(|stream| {
        warn!("Open for write failed: {}", stream);
        DumpError { stream, written: 0 }
    })?;

    let result = dump_stream(schema, &mut stream, options);
    let closed = stream.close();

    let written = result?;
    closed.map_err(|stream| DumpError { stream, written })?;
    Ok(written)
}
