use std::fs;
use std::path::Path;

use tracing::debug;

use super::view::{CodeView, CodeWriter, out_of_range};
use crate::error::{Error, Result};

/// Code image held in memory, mapped at a fixed base address.
///
/// Used for offline analysis of code-segment dumps and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    base: u64,
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub fn new(base: u64, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    /// Load a raw dump whose first byte lives at `base`.
    pub fn from_file<P: AsRef<Path>>(path: P, base: u64) -> Result<Self> {
        let bytes = fs::read(&path)?;
        debug!(
            "Loaded {} bytes from {} at base {:#x}",
            bytes.len(),
            path.as_ref().display(),
            base
        );
        Ok(Self::new(base, bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn range_of(&self, address: u64, len: usize) -> Option<std::ops::Range<usize>> {
        if !self.contains(address, len) {
            return None;
        }
        let start = (address - self.base) as usize;
        Some(start..start + len)
    }
}

impl CodeView for ByteBuffer {
    fn base_address(&self) -> u64 {
        self.base
    }

    fn end_address(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    fn read_bytes(&self, address: u64, len: usize) -> Result<&[u8]> {
        match self.range_of(address, len) {
            Some(range) => Ok(&self.bytes[range]),
            None => Err(out_of_range(
                address,
                len,
                self.base,
                self.end_address(),
            )),
        }
    }
}

impl CodeWriter for ByteBuffer {
    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        let range = self
            .range_of(address, bytes.len())
            .ok_or_else(|| Error::MemoryWriteFailed {
                address,
                message: format!("{} bytes outside image", bytes.len()),
            })?;
        self.bytes[range].copy_from_slice(bytes);
        Ok(())
    }
}
