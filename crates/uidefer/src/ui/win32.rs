//! [`NativeUi`] backed by Win32 combo box and list view messages.
//!
//! Text goes through the ANSI (`A`) entry points unchanged.

use std::ffi::{CStr, c_void};

use windows::Win32::Foundation::{HWND, LPARAM, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    GetDC, GetTextExtentPoint32A, HDC, HRGN, RDW_ERASE, RDW_INVALIDATE, RDW_NOCHILDREN,
    RedrawWindow, ReleaseDC,
};
use windows::Win32::UI::Controls::{
    CB_SETMINVISIBLE, I_IMAGECALLBACK, LPSTR_TEXTCALLBACKA, LVIF_IMAGE, LVIF_PARAM, LVIF_TEXT,
    LVITEMA, LVM_INSERTITEMA,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CB_ADDSTRING, CB_GETDROPPEDWIDTH, CB_INITSTORAGE, CB_SETDROPPEDWIDTH, CB_SETITEMDATA,
    CBS_SORT, GWL_STYLE, SendMessageA, WM_SETREDRAW,
};

use super::{AddOutcome, ControlHandle, DeviceContext, ItemData, ListItem, ListPosition, NativeUi};

/// Controls living in this process, driven with `SendMessageA`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Ui;

impl Win32Ui {
    pub fn new() -> Self {
        Self
    }
}

fn hwnd(control: ControlHandle) -> HWND {
    HWND(control.raw() as *mut c_void)
}

fn hdc(dc: DeviceContext) -> HDC {
    HDC(dc.0 as *mut c_void)
}

fn send(control: ControlHandle, msg: u32, wparam: usize, lparam: isize) -> isize {
    // SAFETY: the handle is a live control owned by the host; these messages
    // take plain integers or pointers that outlive the call.
    unsafe { SendMessageA(hwnd(control), msg, WPARAM(wparam), LPARAM(lparam)) }.0
}

#[cfg(target_pointer_width = "64")]
fn window_style(control: ControlHandle) -> isize {
    use windows::Win32::UI::WindowsAndMessaging::GetWindowLongPtrA;
    // SAFETY: reading a window long has no side effects.
    unsafe { GetWindowLongPtrA(hwnd(control), GWL_STYLE) }
}

#[cfg(not(target_pointer_width = "64"))]
fn window_style(control: ControlHandle) -> isize {
    use windows::Win32::UI::WindowsAndMessaging::GetWindowLongA;
    // SAFETY: reading a window long has no side effects.
    unsafe { GetWindowLongA(hwnd(control), GWL_STYLE) as isize }
}

impl NativeUi for Win32Ui {
    fn set_redraw(&mut self, control: ControlHandle, enabled: bool) {
        send(control, WM_SETREDRAW, enabled as usize, 0);
    }

    fn force_redraw(&mut self, control: ControlHandle) {
        // SAFETY: null update rect/region means the whole client area.
        unsafe {
            let _ = RedrawWindow(
                hwnd(control),
                None,
                HRGN::default(),
                RDW_ERASE | RDW_INVALIDATE | RDW_NOCHILDREN,
            );
        }
    }

    fn set_min_visible(&mut self, control: ControlHandle, count: u32) {
        send(control, CB_SETMINVISIBLE, count as usize, 0);
    }

    fn has_sort_style(&self, control: ControlHandle) -> bool {
        let sort = CBS_SORT as isize;
        window_style(control) & sort == sort
    }

    fn init_storage(&mut self, control: ControlHandle, items: usize, text_bytes: usize) {
        send(control, CB_INITSTORAGE, items, text_bytes as isize);
    }

    fn add_string(&mut self, control: ControlHandle, text: &CStr) -> AddOutcome {
        AddOutcome::from_code(send(control, CB_ADDSTRING, 0, text.as_ptr() as isize))
    }

    fn set_item_data(&mut self, control: ControlHandle, index: usize, data: ItemData) {
        send(control, CB_SETITEMDATA, index, data.0 as isize);
    }

    fn dropped_width(&self, control: ControlHandle) -> i32 {
        send(control, CB_GETDROPPEDWIDTH, 0, 0) as i32
    }

    fn set_dropped_width(&mut self, control: ControlHandle, width: i32) {
        send(control, CB_SETDROPPEDWIDTH, width as usize, 0);
    }

    fn acquire_dc(&mut self, control: ControlHandle) -> Option<DeviceContext> {
        // SAFETY: released by `release_dc` on the same control.
        let dc = unsafe { GetDC(hwnd(control)) };
        if dc.is_invalid() {
            None
        } else {
            Some(DeviceContext(dc.0 as usize))
        }
    }

    fn release_dc(&mut self, control: ControlHandle, dc: DeviceContext) {
        // SAFETY: `dc` came from `acquire_dc` for this control.
        unsafe {
            ReleaseDC(hwnd(control), hdc(dc));
        }
    }

    fn text_width(&self, dc: DeviceContext, text: &CStr) -> Option<i32> {
        let mut size = SIZE::default();
        // SAFETY: `size` is a valid out pointer for the duration of the call.
        let ok = unsafe { GetTextExtentPoint32A(hdc(dc), text.to_bytes(), &mut size) };
        ok.as_bool().then_some(size.cx)
    }

    fn insert_list_item(&mut self, control: ControlHandle, item: &ListItem) -> Option<usize> {
        let mut row = LVITEMA {
            mask: LVIF_PARAM | LVIF_TEXT,
            iItem: match item.position {
                ListPosition::Append => i32::MAX,
                ListPosition::At(index) => index,
            },
            lParam: LPARAM(item.data.0 as isize),
            pszText: LPSTR_TEXTCALLBACKA,
            ..Default::default()
        };
        if item.image_callback {
            row.mask |= LVIF_IMAGE;
            row.iImage = I_IMAGECALLBACK;
        }

        let index = send(control, LVM_INSERTITEMA, 0, &row as *const LVITEMA as isize);
        usize::try_from(index).ok()
    }
}
