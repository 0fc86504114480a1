//! Sub-byte bitfield codec
//!
//! A bitfield is `size` bits (1-7) starting at bit `position` of a single
//! byte. Flags are the `size == 1` case. `position + size` must not exceed 8;
//! that is a schema construction error, checked where fields are declared.

/// Mask with bits `[position, position + size)` set
#[inline]
pub const fn mask_for(position: u8, size: u8) -> u8 {
    (((1u16 << size) - 1) << position) as u8
}

/// Extract the field and shift it down to the low bits
#[inline]
pub const fn read_bits(byte: u8, position: u8, size: u8) -> u8 {
    (byte & mask_for(position, size)) >> position
}

/// Replace the field with `value`
///
/// Bits of `value` above `size` are dropped silently; neighbouring bits in
/// `byte` are left untouched.
#[inline]
pub fn write_bits(byte: &mut u8, position: u8, size: u8, value: u8) {
    let mask = mask_for(position, size);
    *byte = (*byte & !mask) | ((value << position) & mask);
}
