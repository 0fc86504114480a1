//! Decimal number codec
//!
//! Parses and prints signed decimal integers without allocating. Exposed
//! publicly so callback fields can reuse the same number format as the
//! built-in integer fields.

use core::fmt::{self, Write};

/// Errors from [`decode_decimal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecimalError {
    /// No digits (empty token or a lone `-`)
    Empty,
    /// A character other than an ASCII digit after the optional sign
    InvalidDigit,
    /// Value does not fit in an `i64`
    Overflow,
}

/// Decode a decimal token
///
/// Accepts an optional leading `-` followed by one or more ASCII digits.
/// Anything else, including a leading `+` or surrounding whitespace, is
/// rejected. Range truncation for narrower fields is up to the caller.
///
/// # Example
/// ```
/// use ucini_core::decimal::{decode_decimal, DecimalError};
/// assert_eq!(decode_decimal("-42"), Ok(-42));
/// assert_eq!(decode_decimal(" 42"), Err(DecimalError::InvalidDigit));
/// ```
pub fn decode_decimal(token: &str) -> Result<i64, DecimalError> {
    let bytes = token.as_bytes();
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, bytes),
    };

    if digits.is_empty() {
        return Err(DecimalError::Empty);
    }

    let mut value: i64 = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return Err(DecimalError::InvalidDigit);
        }
        let digit = i64::from(byte - b'0');
        // Accumulate toward the sign so i64::MIN stays reachable
        value = value
            .checked_mul(10)
            .and_then(|v| {
                if negative {
                    v.checked_sub(digit)
                } else {
                    v.checked_add(digit)
                }
            })
            .ok_or(DecimalError::Overflow)?;
    }

    Ok(value)
}

/// Append the decimal text of `value` to `out`
///
/// Emits a single leading `-` for negative values and `0` for zero. Digits
/// are produced most significant first by recursing on `value / 10`.
///
/// # Example
/// ```
/// use ucini_core::decimal::encode_decimal;
/// let mut line: heapless::String<16> = heapless::String::new();
/// line.push_str("port=").unwrap();
/// encode_decimal(&mut line, 8080).unwrap();
/// assert_eq!(line.as_str(), "port=8080");
/// ```
pub fn encode_decimal<W: Write + ?Sized>(out: &mut W, value: i64) -> fmt::Result {
    if value < 0 {
        out.write_char('-')?;
    }
    encode_magnitude(out, value.unsigned_abs())
}

/// Recursion depth is bounded by the digit count (at most 20)
fn encode_magnitude<W: Write + ?Sized>(out: &mut W, magnitude: u64) -> fmt::Result {
    if magnitude >= 10 {
        encode_magnitude(out, magnitude / 10)?;
    }
    out.write_char(char::from(b'0' + (magnitude % 10) as u8))
}
