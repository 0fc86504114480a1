//! Engine configuration
//!
//! Compile-time bounds and the run-time options accepted by the dump
//! driver.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum line length, terminator included
///
/// Bounds the stack buffers used for reading and formatting lines.
pub const MAX_LINE_LENGTH: usize = 80;

/// How unsigned 32-bit integer fields are dumped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnsignedFormat {
    /// Reinterpret as signed, so `4294967295` is written as `-1`
    ///
    /// Matches configuration files written by earlier firmware. Parsing the
    /// text back restores the same bit pattern.
    #[default]
    Compat,
    /// Write the true unsigned value
    Exact,
}

/// Dump options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Options {
    /// Formatting of unsigned 32-bit fields
    pub unsigned_format: UnsignedFormat,
}

impl Options {
    /// Options that write unsigned 32-bit values as unsigned text
    pub const fn exact() -> Self {
        Self {
            unsigned_format: UnsignedFormat::Exact,
        }
    }
}
