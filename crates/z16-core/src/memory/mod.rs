//! Flat byte-addressable memory model.
//!
//! Memory is exactly the 16-bit address space, so every `u16` is a valid
//! byte address. Multi-byte values are little-endian.

/// Load/store and fetch bounds policy helpers.
pub mod access;

pub use access::{fetch_in_bounds, resolve_data_address, BYTE_ACCESS_BYTES, WORD_ACCESS_BYTES};

use crate::FaultCode;

/// Size in bytes of the flat architectural address space (64 KiB).
pub const MEMORY_BYTES: usize = u16::MAX as usize + 1;

/// Allocates a canonical zeroed 64 KiB address-space backing store.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; MEMORY_BYTES].into_boxed_slice()
}

/// Reads the little-endian word at `addr`, `addr + 1`.
///
/// Returns `None` when the second byte would lie past the end of `memory`.
#[must_use]
pub fn read_u16_le(memory: &[u8], addr: u16) -> Option<u16> {
    let start = usize::from(addr);
    let bytes = memory.get(start..start + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Writes `value` little-endian at `addr`, `addr + 1`.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfRange`] when the word does not fit.
pub fn write_u16_le(memory: &mut [u8], addr: u16, value: u16) -> Result<(), FaultCode> {
    let start = usize::from(addr);
    let slot = memory
        .get_mut(start..start + 2)
        .ok_or(FaultCode::AddressOutOfRange)?;
    slot.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Writes one byte at `addr`.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfRange`] when `addr` lies past the end of
/// `memory`.
pub fn write_u8(memory: &mut [u8], addr: u16, value: u8) -> Result<(), FaultCode> {
    let slot = memory
        .get_mut(usize::from(addr))
        .ok_or(FaultCode::AddressOutOfRange)?;
    *slot = value;
    Ok(())
}

/// Returns the NUL-terminated byte string starting at `addr`, without the NUL.
///
/// # Errors
///
/// Returns [`FaultCode::UnterminatedString`] when no NUL byte occurs between
/// `addr` and the end of memory.
pub fn read_c_string(memory: &[u8], addr: u16) -> Result<&[u8], FaultCode> {
    let tail = memory
        .get(usize::from(addr)..)
        .ok_or(FaultCode::UnterminatedString)?;
    let len = tail
        .iter()
        .position(|byte| *byte == 0)
        .ok_or(FaultCode::UnterminatedString)?;
    Ok(&tail[..len])
}
