//! Helper functions for instruction execution.

use crate::decoder::sign_extend;
use crate::memory::{read_u16_le, resolve_data_address, BYTE_ACCESS_BYTES, WORD_ACCESS_BYTES};
use crate::FaultCode;

/// Reinterprets a register pattern as two's complement.
#[must_use]
pub const fn as_signed(value: u16) -> i16 {
    i16::from_ne_bytes(value.to_ne_bytes())
}

/// Reinterprets a two's-complement value as a register pattern.
#[must_use]
pub const fn as_word(value: i16) -> u16 {
    u16::from_ne_bytes(value.to_ne_bytes())
}

/// Link address written by `jal` / `jalr`. Wraps modulo 2^16.
#[must_use]
pub const fn link_address(pc: u16) -> u16 {
    pc.wrapping_add(2)
}

/// Byte width of a load or store operation.
#[must_use]
pub const fn access_width(is_word: bool) -> u8 {
    if is_word {
        WORD_ACCESS_BYTES
    } else {
        BYTE_ACCESS_BYTES
    }
}

/// Reads a byte with sign or zero extension.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfRange`] when `base + offset` leaves memory.
pub fn load_byte(memory: &[u8], base: u16, offset: i16, signed: bool) -> Result<u16, FaultCode> {
    let addr = resolve_data_address(base, offset, BYTE_ACCESS_BYTES)?;
    let byte = *memory
        .get(usize::from(addr))
        .ok_or(FaultCode::AddressOutOfRange)?;
    Ok(if signed {
        as_word(sign_extend(u16::from(byte), 8))
    } else {
        u16::from(byte)
    })
}

/// Reads a little-endian word.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfRange`] when either byte leaves memory.
pub fn load_word(memory: &[u8], base: u16, offset: i16) -> Result<u16, FaultCode> {
    let addr = resolve_data_address(base, offset, WORD_ACCESS_BYTES)?;
    read_u16_le(memory, addr).ok_or(FaultCode::AddressOutOfRange)
}
