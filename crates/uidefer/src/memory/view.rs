//! Read and write access to a code image.
//!
//! The scanner and pairing engine only ever see a [`CodeView`], so they run
//! the same against a live module or a synthetic buffer in tests.

use crate::error::{Error, Result};

/// Read-only byte-range accessor over a code image `[base, end)`.
pub trait CodeView {
    fn base_address(&self) -> u64;

    /// One past the last readable address.
    fn end_address(&self) -> u64;

    /// Borrow `len` bytes starting at `address`.
    fn read_bytes(&self, address: u64, len: usize) -> Result<&[u8]>;

    fn contains(&self, address: u64, len: usize) -> bool {
        address >= self.base_address()
            && address
                .checked_add(len as u64)
                .is_some_and(|end| end <= self.end_address())
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        Ok(self.read_bytes(address, 1)?[0])
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Write access used by the call-site patcher.
pub trait CodeWriter {
    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()>;
}

pub(crate) fn out_of_range(address: u64, len: usize, base: u64, end: u64) -> Error {
    Error::MemoryReadFailed {
        address,
        message: format!(
            "{} bytes outside image range {:#x}..{:#x}",
            len, base, end
        ),
    }
}
