//! INI files for microcontrollers
//!
//! Maps `[section]` / `key=value` text onto statically declared fields of
//! host data structures, in both directions, without a heap:
//!
//! - Decimal codec (signed integers, no allocation)
//! - Bitfield codec (1-7 bit fields and single-bit flags)
//! - Line tokenizer
//! - Schema with round-robin name resolution
//! - Type dispatch between text tokens and host fields
//! - Parse and dump drivers over a [`ucini_stream::LineStream`]
//!
//! # Example
//!
//! ```
//! use core::cell::Cell;
//! use ucini_core::{parse, Field, FieldDescriptor, Schema, Section};
//! use ucini_stream::{BlockId, MemoryBlocks};
//!
//! let port = Cell::new(0u16);
//! let flags = Cell::new(0u8);
//! let net = [
//!     FieldDescriptor::new("port", Field::u16(&port)),
//!     FieldDescriptor::new("dhcp", Field::flag(&flags, 0)),
//! ];
//! let sections = [Section::new("net", &net)];
//! let schema = Schema::new(&sections);
//!
//! let mut eeprom = *b"[net]\nport=8080\ndhcp=y\n";
//! let mut blocks: MemoryBlocks<'_, 1> = MemoryBlocks::new();
//! blocks.insert(BlockId(0), &mut eeprom).unwrap();
//!
//! assert_eq!(parse(&schema, &mut blocks, &BlockId(0)), Ok(2));
//! assert_eq!(port.get(), 8080);
//! assert_eq!(flags.get() & 1, 1);
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod bits;
pub mod decimal;
pub mod driver;
pub mod field;
pub mod line;
pub mod options;
pub mod schema;
pub mod tag;

pub use decimal::{decode_decimal, encode_decimal, DecimalError};
pub use driver::{dump, dump_stream, dump_with_options, parse, parse_stream, DumpError, ParseCursor};
pub use field::{Access, Callback, Field, Integer, TextSlot, ValueError};
pub use line::{tokenize_line, Line, LineBuffer};
pub use options::{Options, UnsignedFormat, MAX_LINE_LENGTH};
pub use schema::{FieldDescriptor, Hint, Schema, Section};
pub use tag::{TypeKind, TypeTag};
