//! Live view over the code segment of the current process.

use std::ffi::c_void;

use windows::Win32::System::Diagnostics::Debug::FlushInstructionCache;
use windows::Win32::System::Memory::{
    PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS, VirtualProtect,
};
use windows::Win32::System::Threading::GetCurrentProcess;

use super::view::{CodeView, CodeWriter, out_of_range};
use crate::error::{Error, Result};

/// Code range `[start, end)` of a module mapped into this process.
///
/// The range is trusted: callers pass the code segment bounds of the host
/// executable, which stay mapped for the lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct LoadedModule {
    start: u64,
    end: u64,
}

impl LoadedModule {
    /// View over an absolute address range.
    ///
    /// # Safety
    ///
    /// `[start, end)` must be mapped and readable for as long as the view
    /// is used.
    pub unsafe fn from_range(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

impl CodeView for LoadedModule {
    fn base_address(&self) -> u64 {
        self.start
    }

    fn end_address(&self) -> u64 {
        self.end
    }

    fn read_bytes(&self, address: u64, len: usize) -> Result<&[u8]> {
        if !self.contains(address, len) {
            return Err(out_of_range(address, len, self.start, self.end));
        }
        // SAFETY: bounds checked above; the range is mapped per the
        // constructor contract.
        Ok(unsafe { std::slice::from_raw_parts(address as *const u8, len) })
    }
}

impl CodeWriter for LoadedModule {
    fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        if !self.contains(address, bytes.len()) {
            return Err(Error::MemoryWriteFailed {
                address,
                message: format!("{} bytes outside code range", bytes.len()),
            });
        }

        let target = address as *mut c_void;
        let mut old = PAGE_PROTECTION_FLAGS(0);

        // SAFETY: the destination lies inside the mapped code range; the
        // previous protection is restored right after the copy.
        unsafe {
            VirtualProtect(target, bytes.len(), PAGE_EXECUTE_READWRITE, &mut old).map_err(
                |e| Error::MemoryWriteFailed {
                    address,
                    message: format!("VirtualProtect failed: {}", e),
                },
            )?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), target as *mut u8, bytes.len());
            let mut unused = PAGE_PROTECTION_FLAGS(0);
            let _ = VirtualProtect(target, bytes.len(), old, &mut unused);
            let _ = FlushInstructionCache(GetCurrentProcess(), Some(target), bytes.len());
        }

        Ok(())
    }
}
