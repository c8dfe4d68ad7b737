//! Persistent register storage (EEPROM)
//!
//! The USB stack mirrors its device status into a small EEPROM so other
//! contexts can observe it without touching the controller.

use crate::HalError;

/// Byte-addressed readable store.
pub trait RegisterStore {
    /// Fill `buf` with the bytes starting at `offset`.
    fn read(
        &mut self,
        offset: u32,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<(), HalError>>;
}

/// Read a little-endian `u16` at `offset`.
pub async fn read_u16_le<S: RegisterStore + ?Sized>(
    store: &mut S,
    offset: u32,
) -> Result<u16, HalError> {
    let mut raw = [0u8; 2];
    store.read(offset, &mut raw).await?;
    Ok(u16::from_le_bytes(raw))
}
