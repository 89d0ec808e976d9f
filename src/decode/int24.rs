//! 24-bit integer fields
//!
//! Every EEG reading is a little-endian 24-bit two's-complement integer.
//! There is exactly one decoding rule: read the three bytes as an unsigned
//! 24-bit magnitude, and if bit 23 is set subtract 2^24.

/// Smallest value a signed 24-bit field can hold.
pub const INT24_MIN: i32 = -(1 << 23);

/// Largest value a signed 24-bit field can hold.
pub const INT24_MAX: i32 = (1 << 23) - 1;

const SIGN_BIT: u32 = 1 << 23;
const MODULUS: i32 = 1 << 24;

/// Unsigned 24-bit little-endian value.
pub const fn decode_uint24(bytes: [u8; 3]) -> u32 {
    (bytes[0] as u32) | ((bytes[1] as u32) << 8) | ((bytes[2] as u32) << 16)
}

/// Signed 24-bit little-endian two's-complement value.
///
/// ```rust
/// use brainwave::decode::decode_int24;
///
/// assert_eq!(decode_int24([0x00, 0x00, 0x00]), 0);
/// assert_eq!(decode_int24([0xFF, 0xFF, 0xFF]), -1);
/// assert_eq!(decode_int24([0xFF, 0xFF, 0x7F]), 8_388_607);
/// assert_eq!(decode_int24([0x00, 0x00, 0x80]), -8_388_608);
/// ```
pub const fn decode_int24(bytes: [u8; 3]) -> i32 {
    let unsigned = decode_uint24(bytes);
    if unsigned & SIGN_BIT != 0 { unsigned as i32 - MODULUS } else { unsigned as i32 }
}

/// Little-endian two's-complement bytes for a value in `INT24_MIN..=INT24_MAX`.
///
/// Returns `None` when the value does not fit in 24 bits.
pub const fn encode_int24(value: i32) -> Option<[u8; 3]> {
    if value < INT24_MIN || value > INT24_MAX {
        return None;
    }
    let bits = (value as u32) & 0x00FF_FFFF;
    Some([bits as u8, (bits >> 8) as u8, (bits >> 16) as u8])
}
