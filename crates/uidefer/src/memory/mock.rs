//! Synthetic code images for tests.

use super::ByteBuffer;

/// Filler byte for gaps between planted instructions (`int3`).
pub const FILLER: u8 = 0xCC;

/// Builds a [`ByteBuffer`] by appending byte runs at a fixed base.
#[derive(Debug, Clone)]
pub struct MockCodeBuilder {
    base: u64,
    bytes: Vec<u8>,
}

impl MockCodeBuilder {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            bytes: Vec::new(),
        }
    }

    /// Absolute address of the next appended byte.
    pub fn position(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    pub fn padding(mut self, len: usize) -> Self {
        self.bytes.resize(self.bytes.len() + len, FILLER);
        self
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Append bytes and report the address they were placed at.
    pub fn plant(mut self, bytes: &[u8], placed_at: &mut u64) -> Self {
        *placed_at = self.position();
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> ByteBuffer {
        ByteBuffer::new(self.base, self.bytes)
    }
}
