//! Recording test double for [`NativeUi`].

use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, CString};
use std::sync::{Arc, Mutex};

use super::{AddOutcome, ControlHandle, DeviceContext, ItemData, ListItem, NativeUi};

/// Width reported per byte of measured text.
pub const CHAR_WIDTH: i32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    SetRedraw(ControlHandle, bool),
    ForceRedraw(ControlHandle),
    SetMinVisible(ControlHandle, u32),
    InitStorage(ControlHandle, usize, usize),
    AddString(ControlHandle, CString),
    SetItemData(ControlHandle, usize, ItemData),
    SetDroppedWidth(ControlHandle, i32),
    AcquireDc(ControlHandle),
    ReleaseDc(ControlHandle),
    TextWidth(CString),
    InsertListItem(ControlHandle, ListItem),
}

/// Controls that record every mutating call into a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    log: Arc<Mutex<Vec<UiCall>>>,
    sorted: HashSet<ControlHandle>,
    widths: HashMap<ControlHandle, i32>,
    item_counts: HashMap<ControlHandle, usize>,
    failing: HashSet<Vec<u8>>,
    no_dc: bool,
    /// Runs inside `insert_list_item`, like a parent notified mid-insert.
    on_list_insert: Option<fn()>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort_style(mut self, control: ControlHandle) -> Self {
        self.sorted.insert(control);
        self
    }

    pub fn with_dropped_width(mut self, control: ControlHandle, width: i32) -> Self {
        self.widths.insert(control, width);
        self
    }

    /// Make `add_string` fail for this text.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.as_bytes().to_vec());
        self
    }

    pub fn without_dc(mut self) -> Self {
        self.no_dc = true;
        self
    }

    pub fn with_list_insert_hook(mut self, hook: fn()) -> Self {
        self.on_list_insert = Some(hook);
        self
    }

    /// Handle onto the log that survives moving the double.
    pub fn shared_log(&self) -> Arc<Mutex<Vec<UiCall>>> {
        Arc::clone(&self.log)
    }

    pub fn calls(&self) -> Vec<UiCall> {
        self.log.lock().unwrap().clone()
    }

    pub fn added_strings(&self) -> Vec<String> {
        added_strings(&self.calls())
    }

    fn record(&self, call: UiCall) {
        self.log.lock().unwrap().push(call);
    }
}

/// Added texts, lossily decoded for readable assertions.
pub fn added_strings(calls: &[UiCall]) -> Vec<String> {
    added_bytes(calls)
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .collect()
}

/// Added texts exactly as the control received them.
pub fn added_bytes(calls: &[UiCall]) -> Vec<Vec<u8>> {
    calls
        .iter()
        .filter_map(|call| match call {
            UiCall::AddString(_, text) => Some(text.to_bytes().to_vec()),
            _ => None,
        })
        .collect()
}

impl NativeUi for RecordingUi {
    fn set_redraw(&mut self, control: ControlHandle, enabled: bool) {
        self.record(UiCall::SetRedraw(control, enabled));
    }

    fn force_redraw(&mut self, control: ControlHandle) {
        self.record(UiCall::ForceRedraw(control));
    }

    fn set_min_visible(&mut self, control: ControlHandle, count: u32) {
        self.record(UiCall::SetMinVisible(control, count));
    }

    fn has_sort_style(&self, control: ControlHandle) -> bool {
        self.sorted.contains(&control)
    }

    fn init_storage(&mut self, control: ControlHandle, items: usize, text_bytes: usize) {
        self.record(UiCall::InitStorage(control, items, text_bytes));
    }

    fn add_string(&mut self, control: ControlHandle, text: &CStr) -> AddOutcome {
        self.record(UiCall::AddString(control, text.to_owned()));
        if self.failing.contains(text.to_bytes()) {
            return AddOutcome::Failed;
        }
        let count = self.item_counts.entry(control).or_default();
        *count += 1;
        AddOutcome::Inserted(*count - 1)
    }

    fn set_item_data(&mut self, control: ControlHandle, index: usize, data: ItemData) {
        self.record(UiCall::SetItemData(control, index, data));
    }

    fn dropped_width(&self, control: ControlHandle) -> i32 {
        self.widths.get(&control).copied().unwrap_or(0)
    }

    fn set_dropped_width(&mut self, control: ControlHandle, width: i32) {
        self.widths.insert(control, width);
        self.record(UiCall::SetDroppedWidth(control, width));
    }

    fn acquire_dc(&mut self, control: ControlHandle) -> Option<DeviceContext> {
        if self.no_dc {
            return None;
        }
        self.record(UiCall::AcquireDc(control));
        Some(DeviceContext(control.raw()))
    }

    fn release_dc(&mut self, control: ControlHandle, _dc: DeviceContext) {
        self.record(UiCall::ReleaseDc(control));
    }

    fn text_width(&self, _dc: DeviceContext, text: &CStr) -> Option<i32> {
        self.record(UiCall::TextWidth(text.to_owned()));
        Some(text.to_bytes().len() as i32 * CHAR_WIDTH)
    }

    fn insert_list_item(&mut self, control: ControlHandle, item: &ListItem) -> Option<usize> {
        self.record(UiCall::InsertListItem(control, *item));
        if let Some(hook) = self.on_list_insert {
            hook();
        }
        let count = self.item_counts.entry(control).or_default();
        *count += 1;
        Some(*count - 1)
    }
}
