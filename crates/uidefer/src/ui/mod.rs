//! Native list and drop-down control primitives.
//!
//! The session and the single-item path only talk to controls through
//! [`NativeUi`]. Handles are borrowed: nothing here creates or destroys a
//! control.

#[cfg(test)]
pub mod recording;
#[cfg(target_os = "windows")]
mod win32;

use std::ffi::CStr;
use std::num::NonZeroUsize;

#[cfg(test)]
pub use recording::{RecordingUi, UiCall};
#[cfg(target_os = "windows")]
pub use win32::Win32Ui;

/// Window handle of a list or drop-down control. Never null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlHandle(NonZeroUsize);

impl ControlHandle {
    /// `None` for a null handle.
    pub fn new(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn raw(self) -> usize {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ControlKind {
    #[strum(serialize = "drop-down")]
    Dropdown,
    #[strum(serialize = "list")]
    List,
}

/// Drawing context acquired for a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceContext(pub usize);

/// Opaque per-item value attached to an inserted entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ItemData(pub usize);

/// Result of adding a string to a drop-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted(usize),
    Failed,
    OutOfSpace,
}

impl AddOutcome {
    /// Map a raw message result (`-1` failed, `-2` out of space).
    pub fn from_code(code: isize) -> Self {
        match code {
            -1 => AddOutcome::Failed,
            -2 => AddOutcome::OutOfSpace,
            index => AddOutcome::Inserted(index as usize),
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            AddOutcome::Inserted(index) => Some(index),
            AddOutcome::Failed | AddOutcome::OutOfSpace => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPosition {
    Append,
    At(i32),
}

impl ListPosition {
    /// `-1` appends.
    pub fn from_index(index: i32) -> Self {
        if index == -1 {
            ListPosition::Append
        } else {
            ListPosition::At(index)
        }
    }
}

/// List row whose text (and optionally image) the control asks for later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListItem {
    pub position: ListPosition,
    pub data: ItemData,
    pub image_callback: bool,
}

/// Text crosses this trait as NUL-terminated narrow strings, byte for byte
/// what the host passed in.
pub trait NativeUi {
    fn set_redraw(&mut self, control: ControlHandle, enabled: bool);

    /// Erase and invalidate the control so it repaints now.
    fn force_redraw(&mut self, control: ControlHandle);

    fn set_min_visible(&mut self, control: ControlHandle, count: u32);

    /// Whether the drop-down keeps its items alphabetically sorted.
    fn has_sort_style(&self, control: ControlHandle) -> bool;

    /// Pre-allocate room for `items` strings totalling `text_bytes`.
    fn init_storage(&mut self, control: ControlHandle, items: usize, text_bytes: usize);

    fn add_string(&mut self, control: ControlHandle, text: &CStr) -> AddOutcome;

    fn set_item_data(&mut self, control: ControlHandle, index: usize, data: ItemData);

    fn dropped_width(&self, control: ControlHandle) -> i32;

    fn set_dropped_width(&mut self, control: ControlHandle, width: i32);

    fn acquire_dc(&mut self, control: ControlHandle) -> Option<DeviceContext>;

    fn release_dc(&mut self, control: ControlHandle, dc: DeviceContext);

    /// Rendered width of `text`, `None` if it could not be measured.
    fn text_width(&self, dc: DeviceContext, text: &CStr) -> Option<i32>;

    fn insert_list_item(&mut self, control: ControlHandle, item: &ListItem) -> Option<usize>;
}

impl<T: NativeUi + ?Sized> NativeUi for Box<T> {
    fn set_redraw(&mut self, control: ControlHandle, enabled: bool) {
        (**self).set_redraw(control, enabled)
    }

    fn force_redraw(&mut self, control: ControlHandle) {
        (**self).force_redraw(control)
    }

    fn set_min_visible(&mut self, control: ControlHandle, count: u32) {
        (**self).set_min_visible(control, count)
    }

    fn has_sort_style(&self, control: ControlHandle) -> bool {
        (**self).has_sort_style(control)
    }

    fn init_storage(&mut self, control: ControlHandle, items: usize, text_bytes: usize) {
        (**self).init_storage(control, items, text_bytes)
    }

    fn add_string(&mut self, control: ControlHandle, text: &CStr) -> AddOutcome {
        (**self).add_string(control, text)
    }

    fn set_item_data(&mut self, control: ControlHandle, index: usize, data: ItemData) {
        (**self).set_item_data(control, index, data)
    }

    fn dropped_width(&self, control: ControlHandle) -> i32 {
        (**self).dropped_width(control)
    }

    fn set_dropped_width(&mut self, control: ControlHandle, width: i32) {
        (**self).set_dropped_width(control, width)
    }

    fn acquire_dc(&mut self, control: ControlHandle) -> Option<DeviceContext> {
        (**self).acquire_dc(control)
    }

    fn release_dc(&mut self, control: ControlHandle, dc: DeviceContext) {
        (**self).release_dc(control, dc)
    }

    fn text_width(&self, dc: DeviceContext, text: &CStr) -> Option<i32> {
        (**self).text_width(dc, text)
    }

    fn insert_list_item(&mut self, control: ControlHandle, item: &ListItem) -> Option<usize> {
        (**self).insert_list_item(control, item)
    }
}
