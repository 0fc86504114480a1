//! uCini stream layer
//!
//! This crate defines the line-oriented stream traits the uCini engine reads
//! from and writes to. Any backing store works as long as it can hand out
//! one line at a time: a flash file, a RAM block, an EEPROM region or a UART.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ucini-core (parse / dump)              │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ucini-stream (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ MemoryBlocks  │       │   IoStream    │
//! │ (RAM/EEPROM)  │       │ (embedded-io) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`stream::LineStream`] - read/write one line, close
//! - [`stream::StreamSource`] - open a stream by identifier

#![no_std]
#![deny(unsafe_code)]

pub mod io;
pub mod memory;
pub mod stream;

// Re-export key traits at crate root for convenience
pub use io::IoStream;
pub use memory::{BlockId, MemoryBlocks, MemoryStream};
pub use stream::{LineStream, OpenMode, StreamError, StreamSource};
