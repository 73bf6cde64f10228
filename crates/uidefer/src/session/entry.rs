use std::cmp::Ordering;
use std::ffi::{CStr, CString};

use crate::ui::ItemData;

/// Buffered drop-down entry owning its copy of the caller's text.
///
/// Text stays in the caller's narrow encoding; it is never decoded.
#[derive(Debug)]
pub struct DeferredEntry {
    pub(super) text: CString,
    pub(super) value: ItemData,
}

impl DeferredEntry {
    pub fn new(text: &CStr, value: ItemData) -> Self {
        #[cfg(test)]
        live::acquire();
        Self {
            text: text.to_owned(),
            value,
        }
    }

    pub fn text(&self) -> &CStr {
        &self.text
    }

    /// Bytes the control stores for this entry, terminator included.
    pub fn storage_len(&self) -> usize {
        self.text.as_bytes_with_nul().len()
    }

    pub fn value(&self) -> ItemData {
        self.value
    }
}

#[cfg(test)]
impl Drop for DeferredEntry {
    fn drop(&mut self) {
        live::release();
    }
}

/// `_stricmp` ordering: ASCII letters fold to lower case, other bytes compare raw.
pub fn compare_ignore_case(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase))
}

/// Stable sort, case-insensitive, descending.
///
/// Entries go first when `_stricmp(a, b) > 0`, the order the sorted
/// drop-down path has always produced; equal keys keep arrival order.
pub fn sort_for_sorted_control(entries: &mut [DeferredEntry]) {
    entries.sort_by(|a, b| compare_ignore_case(b.text.to_bytes(), a.text.to_bytes()));
}
