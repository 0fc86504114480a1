//! Field accessors and type dispatch
//!
//! A [`Field`] is a typed, non-owning handle on one piece of host state. Host
//! state is reached through `Cell`/`RefCell`, so a schema can hold shared
//! references to it and still update it while parsing. Flags and bitfields
//! packed into the same byte share one `&Cell<u8>`.

use core::cell::{Cell, RefCell};
use core::fmt::{self, Write};

use heapless::String;

use crate::bits::{read_bits, write_bits};
use crate::decimal::{decode_decimal, encode_decimal, DecimalError};
use crate::options::{Options, UnsignedFormat};
use crate::tag::{TypeKind, TypeTag};

/// Why a value could not be applied to or read from a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueError {
    /// Integer or bitfield value is not a decimal number
    Decimal(DecimalError),
    /// Flag value is not one of `y`, `n`, `1`, `0`
    InvalidFlag,
    /// Text does not fit in the field's storage
    TooLong,
    /// Field storage is currently borrowed elsewhere
    Busy,
    /// Callback refused the value
    Rejected,
    /// Output formatting failed
    Format,
}

impl From<DecimalError> for ValueError {
    fn from(e: DecimalError) -> Self {
        ValueError::Decimal(e)
    }
}

impl From<fmt::Error> for ValueError {
    fn from(_: fmt::Error) -> Self {
        ValueError::Format
    }
}

/// Integer storage of a given width and signedness
#[derive(Debug, Clone, Copy)]
pub enum Integer<'a> {
    /// 8-bit unsigned
    U8(&'a Cell<u8>),
    /// 8-bit signed
    I8(&'a Cell<i8>),
    /// 16-bit unsigned
    U16(&'a Cell<u16>),
    /// 16-bit signed
    I16(&'a Cell<i16>),
    /// 32-bit unsigned, dumped as signed unless [`UnsignedFormat::Exact`]
    U32(&'a Cell<u32>),
    /// 32-bit signed
    I32(&'a Cell<i32>),
}

impl<'a> Integer<'a> {
    /// Width in bytes
    pub fn size(&self) -> u8 {
        match self {
            Integer::U8(_) | Integer::I8(_) => 1,
            Integer::U16(_) | Integer::I16(_) => 2,
            Integer::U32(_) | Integer::I32(_) => 4,
        }
    }

    /// Whether negative values are representable
    pub fn is_signed(&self) -> bool {
        matches!(self, Integer::I8(_) | Integer::I16(_) | Integer::I32(_))
    }

    /// Store the low `size()` bytes of `value`
    pub fn store(&self, value: i64) {
        match self {
            Integer::U8(c) => c.set(value as u8),
            Integer::I8(c) => c.set(value as i8),
            Integer::U16(c) => c.set(value as u16),
            Integer::I16(c) => c.set(value as i16),
            Integer::U32(c) => c.set(value as u32),
            Integer::I32(c) => c.set(value as i32),
        }
    }

    /// Read the stored value
    ///
    /// With [`UnsignedFormat::Compat`] an unsigned 32-bit value is read back
    /// through the signed type, so values above `i32::MAX` come out negative.
    pub fn load(&self, format: UnsignedFormat) -> i64 {
        match self {
            Integer::U8(c) => i64::from(c.get()),
            Integer::I8(c) => i64::from(c.get()),
            Integer::U16(c) => i64::from(c.get()),
            Integer::I16(c) => i64::from(c.get()),
            Integer::U32(c) => match format {
                UnsignedFormat::Compat => i64::from(c.get() as i32),
                UnsignedFormat::Exact => i64::from(c.get()),
            },
            Integer::I32(c) => i64::from(c.get()),
        }
    }
}

/// Text storage
///
/// Implemented for `RefCell<heapless::String<N>>`; implement it for other
/// fixed buffers as needed.
pub trait TextSlot {
    /// Replace the stored text with `value`
    ///
    /// Must leave the storage untouched when returning an error.
    fn store(&self, value: &str) -> Result<(), ValueError>;

    /// Append the stored text to `out`
    fn load(&self, out: &mut dyn Write) -> Result<(), ValueError>;
}

impl<const N: usize> TextSlot for RefCell<String<N>> {
    fn store(&self, value: &str) -> Result<(), ValueError> {
        if value.len() > N {
            return Err(ValueError::TooLong);
        }
        let mut text = self.try_borrow_mut().map_err(|_| ValueError::Busy)?;
        text.clear();
        text.push_str(value).map_err(|_| ValueError::TooLong)
    }

    fn load(&self, out: &mut dyn Write) -> Result<(), ValueError> {
        let text = self.try_borrow().map_err(|_| ValueError::Busy)?;
        out.write_str(text.as_str())?;
        Ok(())
    }
}

/// Direction of a callback invocation
pub enum Access<'s> {
    /// Parsing: the raw value text from the file
    Read(&'s str),
    /// Dumping: append the value text to the output line
    Write(&'s mut dyn Write),
}

/// Escape hatch for types the built-in dispatcher does not model
///
/// Closures `Fn(Access<'_>) -> Result<(), ValueError>` implement this
/// directly. The decimal codec is public so callbacks can reuse it.
pub trait Callback {
    /// Consume a parsed value or produce the value to dump
    fn access(&self, access: Access<'_>) -> Result<(), ValueError>;
}

impl<F> Callback for F
where
    F: Fn(Access<'_>) -> Result<(), ValueError>,
{
    fn access(&self, access: Access<'_>) -> Result<(), ValueError> {
        self(access)
    }
}

/// Typed handle on one host value
#[derive(Clone, Copy)]
pub enum Field<'a> {
    /// Text copied verbatim, whitespace included
    Text(&'a dyn TextSlot),
    /// Sized integer
    Integer(Integer<'a>),
    /// One bit of a byte, written as `y`/`n`
    Flag { byte: &'a Cell<u8>, bit: u8 },
    /// `size` bits (1-7) at `position` of a byte, written as decimal
    Bitfield {
        byte: &'a Cell<u8>,
        position: u8,
        size: u8,
    },
    /// User-defined conversion
    Callback(&'a dyn Callback),
}

impl<'a> Field<'a> {
    /// Text field backed by a fixed-capacity string
    pub fn text<const N: usize>(slot: &'a RefCell<String<N>>) -> Self {
        Field::Text(slot)
    }

    /// Unsigned 8-bit integer
    pub fn u8(cell: &'a Cell<u8>) -> Self {
        Field::Integer(Integer::U8(cell))
    }

    /// Signed 8-bit integer
    pub fn i8(cell: &'a Cell<i8>) -> Self {
        Field::Integer(Integer::I8(cell))
    }

    /// Unsigned 16-bit integer
    pub fn u16(cell: &'a Cell<u16>) -> Self {
        Field::Integer(Integer::U16(cell))
    }

    /// Signed 16-bit integer
    pub fn i16(cell: &'a Cell<i16>) -> Self {
        Field::Integer(Integer::I16(cell))
    }

    /// Unsigned 32-bit integer
    pub fn u32(cell: &'a Cell<u32>) -> Self {
        Field::Integer(Integer::U32(cell))
    }

    /// Signed 32-bit integer
    pub fn i32(cell: &'a Cell<i32>) -> Self {
        Field::Integer(Integer::I32(cell))
    }

    /// Flag at bit `bit` (0-7) of `byte`
    pub fn flag(byte: &'a Cell<u8>, bit: u8) -> Self {
        debug_assert!(bit < 8, "flag bit out of range");
        Field::Flag { byte, bit }
    }

    /// Bitfield of `size` bits (1-7) starting at bit `position` of `byte`
    pub fn bits(byte: &'a Cell<u8>, position: u8, size: u8) -> Self {
        debug_assert!((1..=7).contains(&size), "bitfield size out of range");
        debug_assert!(position + size <= 8, "bitfield does not fit in a byte");
        Field::Bitfield {
            byte,
            position,
            size,
        }
    }

    /// Value converted by a user handler
    pub fn callback(handler: &'a dyn Callback) -> Self {
        Field::Callback(handler)
    }

    /// Encoding attributes of this field
    pub fn kind(&self) -> TypeKind {
        match self {
            Field::Text(_) => TypeKind::String,
            Field::Integer(int) => TypeKind::Integer {
                size: int.size(),
                signed: int.is_signed(),
            },
            Field::Flag { bit, .. } => TypeKind::Flag { bit: *bit },
            Field::Bitfield { position, size, .. } => TypeKind::Bitfield {
                size: *size,
                position: *position,
            },
            Field::Callback(_) => TypeKind::Callback,
        }
    }

    /// Packed form of [`kind`](Self::kind)
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::encode(self.kind())
    }

    /// Apply a value token from the file to the host state
    ///
    /// On error the host state is left as it was.
    pub fn assign(&self, value: &str) -> Result<(), ValueError> {
        match self {
            Field::Text(slot) => slot.store(value),
            Field::Integer(int) => {
                int.store(decode_decimal(value)?);
                Ok(())
            }
            Field::Flag { byte, bit } => {
                let set = match value {
                    "y" | "1" => 1,
                    "n" | "0" => 0,
                    _ => return Err(ValueError::InvalidFlag),
                };
                update_bits(byte, *bit, 1, set);
                Ok(())
            }
            Field::Bitfield {
                byte,
                position,
                size,
            } => {
                let value = decode_decimal(value)?;
                update_bits(byte, *position, *size, value as u8);
                Ok(())
            }
            Field::Callback(handler) => handler.access(Access::Read(value)),
        }
    }

    /// Append the host value's text to `out`
    pub fn format<W: Write>(&self, out: &mut W, options: &Options) -> Result<(), ValueError> {
        match self {
            Field::Text(slot) => slot.load(out),
            Field::Integer(int) => {
                encode_decimal(out, int.load(options.unsigned_format))?;
                Ok(())
            }
            Field::Flag { byte, bit } => {
                let text = if read_bits(byte.get(), *bit, 1) != 0 {
                    "y"
                } else {
                    "n"
                };
                out.write_str(text)?;
                Ok(())
            }
            Field::Bitfield {
                byte,
                position,
                size,
            } => {
                encode_decimal(out, i64::from(read_bits(byte.get(), *position, *size)))?;
                Ok(())
            }
            Field::Callback(handler) => handler.access(Access::Write(out)),
        }
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.kind()).finish()
    }
}

fn update_bits(byte: &Cell<u8>, position: u8, size: u8, value: u8) {
    let mut bits = byte.get();
    write_bits(&mut bits, position, size, value);
    byte.set(bits);
}
