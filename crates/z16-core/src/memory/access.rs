//! Deterministic bounds policy for fetches and data accesses.

use crate::FaultCode;

/// Byte width of `sb`, `lb` and `lbu` accesses.
pub const BYTE_ACCESS_BYTES: u8 = 1;

/// Byte width of `sw`, `lw` accesses and instruction fetch.
pub const WORD_ACCESS_BYTES: u8 = 2;

/// Returns `true` when a full instruction word can be fetched from `pc`.
///
/// A fetch at `0xFFFF` would need a byte past the end of memory and is
/// reported as address-space exhaustion by the fetch loop.
#[must_use]
pub const fn fetch_in_bounds(pc: u16) -> bool {
    pc < u16::MAX
}

/// Computes the effective address `base + offset` for a `width`-byte access.
///
/// The sum is formed without wrapping. Memory covers the whole `u16` range, so
/// an access is legal exactly when its first and last byte addresses fit in a
/// `u16`.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfRange`] when any accessed byte lies below
/// zero or at or above 64 KiB.
pub fn resolve_data_address(base: u16, offset: i16, width: u8) -> Result<u16, FaultCode> {
    let first = i32::from(base) + i32::from(offset);
    let last = first + i32::from(width.max(1)) - 1;

    match (u16::try_from(first), u16::try_from(last)) {
        (Ok(addr), Ok(_)) => Ok(addr),
        _ => Err(FaultCode::AddressOutOfRange),
    }
}
