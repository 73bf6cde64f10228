//! Immediate insertion, used whenever no deferred session is active.

use std::ffi::CStr;

use tracing::debug;

use crate::ui::{ControlHandle, ItemData, ListItem, ListPosition, NativeUi};

/// Add one drop-down entry right away.
///
/// With `allow_resize`, the drop width grows to fit `text` first. A missing
/// drawing context skips the measurement.
pub fn insert_dropdown_item<U: NativeUi + ?Sized>(
    ui: &mut U,
    control: ControlHandle,
    text: &CStr,
    value: ItemData,
    allow_resize: bool,
) {
    if allow_resize {
        grow_to_fit(ui, control, text);
    }

    if let Some(index) = ui.add_string(control, text).index() {
        ui.set_item_data(control, index, value);
    }
}

fn grow_to_fit<U: NativeUi + ?Sized>(ui: &mut U, control: ControlHandle, text: &CStr) {
    let Some(dc) = ui.acquire_dc(control) else {
        debug!("No drawing context for {:#x}, keeping width", control.raw());
        return;
    };

    if let Some(width) = ui.text_width(dc, text)
        && width > ui.dropped_width(control)
    {
        ui.set_dropped_width(control, width);
    }

    ui.release_dc(control, dc);
}

/// Insert one list row whose text is supplied by the control on demand.
pub fn insert_list_item<U: NativeUi + ?Sized>(
    ui: &mut U,
    control: ControlHandle,
    value: ItemData,
    use_image: bool,
    index: i32,
) -> Option<usize> {
    let item = ListItem {
        position: ListPosition::from_index(index),
        data: value,
        image_callback: use_image,
    };
    ui.insert_list_item(control, &item)
}
