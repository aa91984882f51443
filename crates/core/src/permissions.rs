//! Encryption permission decoding
//!
//! The `P` entry of an encryption dictionary is a 32-bit flag word. Bit 5
//! allows content extraction in general; from security handler revision 3
//! on, bit 10 separately allows extraction for accessibility.

use crate::awam::Status;

/// Render the low `width` bits of `value` as a most-significant-first string.
///
/// Negative values are rendered in two's complement, as flag words with the
/// high bits set usually are.
pub fn to_bit_string(value: i64, width: u32) -> String {
    (0..width)
        .rev()
        .map(|bit| if (value >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}

/// Whether the 1-based `position` of the flag word is set.
pub fn flag_set(flags: i64, position: u32) -> bool {
    position >= 1 && (flags >> (position - 1)) & 1 == 1
}

/// Accessibility result for an encrypted document.
///
/// Returns `None` for revisions below 2, which the audit does not decide.
pub fn accessibility_permission(flags: i64, revision: i64) -> Option<Status> {
    match revision {
        r if r < 2 => None,
        2 => Some(flag_set(flags, 5).into()),
        _ => Some((flag_set(flags, 5) || flag_set(flags, 10)).into()),
    }
}
