//! Line buffer and tokenizer
//!
//! Text format, one directive per line:
//! ```text
//! [section]          section header, name is everything between [ and ]
//! key=value ; note   entry, value ends at the line break or at ';'
//! ```
//! Whitespace is significant everywhere and never trimmed. Anything that is
//! neither a header nor contains `=` is ignored.

use core::fmt;

use heapless::String;

use crate::options::MAX_LINE_LENGTH;

/// One tokenized input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line<'a> {
    /// `[name]`
    Section(&'a str),
    /// `key=value`
    Entry { key: &'a str, value: &'a str },
    /// Blank, comment-only or malformed line
    Ignored,
}

/// Split one line into a section header or a key/value pair
///
/// A missing line terminator is tolerated, so the last line of a truncated
/// file tokenizes like any other. A header without a closing `]` is ignored.
pub fn tokenize_line(line: &str) -> Line<'_> {
    let line = match line.find(|c: char| c == '\r' || c == '\n') {
        Some(end) => &line[..end],
        None => line,
    };

    if let Some(header) = line.strip_prefix('[') {
        return match header.find(']') {
            Some(end) => Line::Section(&header[..end]),
            None => Line::Ignored,
        };
    }

    let Some((key, rest)) = line.split_once('=') else {
        return Line::Ignored;
    };

    let value = match rest.find(';') {
        Some(comment) => &rest[..comment],
        None => rest,
    };

    Line::Entry { key, value }
}

/// Fixed-capacity output line
///
/// Writes past [`MAX_LINE_LENGTH`] are clipped instead of failing, mirroring
/// how the stream layer clips overlong input lines. [`is_truncated`] reports
/// whether that happened.
///
/// [`is_truncated`]: LineBuffer::is_truncated
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    text: String<MAX_LINE_LENGTH>,
    truncated: bool,
}

impl LineBuffer {
    /// Create an empty line
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            truncated: false,
        }
    }

    /// Reset to an empty line
    pub fn clear(&mut self) {
        self.text.clear();
        self.truncated = false;
    }

    /// Append as much of `s` as fits
    pub fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            if self.text.push(c).is_err() {
                self.truncated = true;
                return;
            }
        }
    }

    /// Append the line break, dropping the last character if the line is full
    pub fn terminate(&mut self) {
        if self.text.len() == self.text.capacity() {
            self.text.pop();
            self.truncated = true;
        }
        // Cannot fail: room was made above
        let _ = self.text.push('\n');
    }

    /// Whether anything was clipped since the last [`clear`](Self::clear)
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Line assembled so far
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether nothing has been pushed since the last clear
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}
