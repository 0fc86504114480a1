//! Packed type descriptor
//!
//! One byte describing how a field is encoded, for schemas that must be
//! stored compactly (EEPROM tables, wire transfer to a configuration tool).
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! ┌───────────┬───┬───┬───────────┐
//! │   TYPE    │SGN│ALT│ NUM       │
//! └───────────┴───┴───┴───────────┘
//! ALT = 0: TYPE is String/Integer/Flag/Callback, NUM is size or bit
//! ALT = 1: TYPE is the bitfield size (1-7),      NUM is its position
//! ```

/// Decoded form of a [`TypeTag`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TypeKind {
    /// Text copied verbatim
    String,
    /// Integer of `size` bytes (1, 2 or 4)
    Integer { size: u8, signed: bool },
    /// Single bit `bit` of a byte
    Flag { bit: u8 },
    /// Handled by a callback
    Callback,
    /// `size` bits at `position` of a byte
    Bitfield { size: u8, position: u8 },
}

/// Packed one-byte type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TypeTag(u8);

impl TypeTag {
    const NUM_MASK: u8 = 0x07;
    const ALTERNATE: u8 = 0x08;
    const SIGNED: u8 = 0x10;
    const TYPE_SHIFT: u8 = 5;

    const TYPE_STRING: u8 = 0;
    const TYPE_INTEGER: u8 = 1;
    const TYPE_FLAG: u8 = 2;
    const TYPE_CALLBACK: u8 = 3;

    /// Pack a [`TypeKind`]
    pub const fn encode(kind: TypeKind) -> Self {
        let bits = match kind {
            TypeKind::String => Self::TYPE_STRING << Self::TYPE_SHIFT,
            TypeKind::Integer { size, signed } => {
                let sign = if signed { Self::SIGNED } else { 0 };
                (Self::TYPE_INTEGER << Self::TYPE_SHIFT) | sign | (size & Self::NUM_MASK)
            }
            TypeKind::Flag { bit } => (Self::TYPE_FLAG << Self::TYPE_SHIFT) | (bit & Self::NUM_MASK),
            TypeKind::Callback => Self::TYPE_CALLBACK << Self::TYPE_SHIFT,
            TypeKind::Bitfield { size, position } => {
                (size << Self::TYPE_SHIFT) | Self::ALTERNATE | (position & Self::NUM_MASK)
            }
        };
        Self(bits)
    }

    /// Wrap a raw byte
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw byte
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Unpack into a [`TypeKind`]
    ///
    /// Returns `None` for bytes no field could have produced: an unknown
    /// primary type, an integer size other than 1/2/4, or a bitfield that
    /// does not fit in its byte.
    pub const fn kind(self) -> Option<TypeKind> {
        let num = self.0 & Self::NUM_MASK;
        let ty = self.0 >> Self::TYPE_SHIFT;

        // The alternate selector reuses TYPE, so it must be checked first
        if self.0 & Self::ALTERNATE != 0 {
            if ty == 0 || num + ty > 8 {
                return None;
            }
            return Some(TypeKind::Bitfield {
                size: ty,
                position: num,
            });
        }

        match ty {
            Self::TYPE_STRING => Some(TypeKind::String),
            Self::TYPE_INTEGER => match num {
                1 | 2 | 4 => Some(TypeKind::Integer {
                    size: num,
                    signed: self.0 & Self::SIGNED != 0,
                }),
                _ => None,
            },
            Self::TYPE_FLAG => Some(TypeKind::Flag { bit: num }),
            Self::TYPE_CALLBACK => Some(TypeKind::Callback),
            _ => None,
        }
    }
}

impl From<TypeKind> for TypeTag {
    fn from(kind: TypeKind) -> Self {
        Self::encode(kind)
    }
}
