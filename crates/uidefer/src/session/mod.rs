//! Deferred drop-down insertion session.
//!
//! `begin` arms a session; drop-down insertions made while it is active are
//! buffered and `end` applies them in one bulk pass with redraw suppressed.
//! List insertions are never buffered, only their redraw is held back until
//! `end`.
//!
//! ```text
//! Idle --begin--> Armed --insert--> Recording --end--> Idle
//!                   |                                   ^
//!                   +----------------end----------------+
//! ```

mod config;
mod entry;

use std::ffi::CStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::insert;
use crate::ui::{ControlHandle, ControlKind, ItemData, NativeUi};

pub use config::{DeferConfig, DeferConfigBuilder};
pub use entry::{DeferredEntry, compare_ignore_case, sort_for_sorted_control};

#[cfg(test)]
pub(crate) use entry::live;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Begun, nothing bound yet.
    Armed,
    /// At least one control bound.
    Recording,
}

#[derive(Debug, Default)]
struct Session {
    dropdown: Option<ControlHandle>,
    list: Option<ControlHandle>,
    text_length: usize,
    allow_resize: bool,
    entries: Vec<DeferredEntry>,
}

impl Session {
    fn is_empty(&self) -> bool {
        self.dropdown.is_none() && self.list.is_none() && self.entries.is_empty()
    }
}

/// Outcome of one `end` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushSummary {
    pub inserted: usize,
    pub failed: usize,
    pub sorted: bool,
    /// New drop width, when the control had to grow.
    pub resized_to: Option<i32>,
}

/// Owns the native controls and at most one active session.
pub struct DeferredInserter<U: NativeUi> {
    ui: U,
    config: DeferConfig,
    session: Option<Session>,
}

impl<U: NativeUi> DeferredInserter<U> {
    pub fn new(ui: U) -> Self {
        Self::with_config(ui, DeferConfig::default())
    }

    pub fn with_config(ui: U, config: DeferConfig) -> Self {
        Self {
            ui,
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &DeferConfig {
        &self.config
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn state(&self) -> SessionState {
        match &self.session {
            None => SessionState::Idle,
            Some(session) if session.is_empty() => SessionState::Armed,
            Some(_) => SessionState::Recording,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn pending(&self) -> &[DeferredEntry] {
        self.session
            .as_ref()
            .map(|s| s.entries.as_slice())
            .unwrap_or_default()
    }

    /// Bytes to reserve for pending text, one terminator per entry included.
    /// Counted over the raw narrow bytes.
    pub fn text_length(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.text_length)
    }

    pub fn resize_allowed(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.allow_resize)
    }

    /// Arm a new session.
    ///
    /// Re-arming an empty session is allowed; a session that already bound a
    /// control is left untouched and reported as `AlreadyActive`.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if let Some(session) = &self.session
            && !session.is_empty()
        {
            return Err(SessionError::AlreadyActive {
                pending: session.entries.len(),
                list_bound: session.list.is_some(),
            });
        }

        self.session = Some(Session::default());
        debug!("Deferred session armed");
        Ok(())
    }

    /// Flush the active session and return to idle. No-op when idle.
    pub fn end(&mut self) -> FlushSummary {
        let Some(session) = self.session.take() else {
            return FlushSummary::default();
        };

        let summary = flush(&mut self.ui, &self.config, session);
        debug!(
            "Deferred session ended: {} inserted, {} failed",
            summary.inserted, summary.failed
        );
        summary
    }

    /// Insert into a drop-down, buffering while a session is active.
    ///
    /// A null handle is ignored; missing text becomes the placeholder.
    pub fn request_dropdown_insert(
        &mut self,
        control: Option<ControlHandle>,
        text: Option<&CStr>,
        value: ItemData,
        allow_resize: bool,
    ) -> Result<(), SessionError> {
        let Some(control) = control else {
            return Ok(());
        };
        let text = text.unwrap_or(self.config.placeholder_text.as_c_str());

        let Some(session) = self.session.as_mut() else {
            insert::insert_dropdown_item(&mut self.ui, control, text, value, allow_resize);
            return Ok(());
        };

        bind(&mut session.dropdown, control, ControlKind::Dropdown)?;
        let entry = DeferredEntry::new(text, value);
        session.text_length += entry.storage_len();
        session.allow_resize |= allow_resize;
        session.entries.push(entry);
        Ok(())
    }

    /// Insert a list row right away; inside a session the first row also
    /// suppresses the list's redraw until `end`.
    pub fn request_list_insert(
        &mut self,
        control: Option<ControlHandle>,
        value: ItemData,
        use_image: bool,
        index: i32,
    ) -> Result<Option<usize>, SessionError> {
        let Some(control) = control else {
            return Ok(None);
        };

        if let Some(session) = self.session.as_mut()
            && session.list.is_none_or(|bound| bound != control)
        {
            bind(&mut session.list, control, ControlKind::List)?;
            self.ui.set_redraw(control, false);
        }

        Ok(insert::insert_list_item(
            &mut self.ui,
            control,
            value,
            use_image,
            index,
        ))
    }
}

fn bind(
    slot: &mut Option<ControlHandle>,
    control: ControlHandle,
    kind: ControlKind,
) -> Result<(), SessionError> {
    match *slot {
        Some(bound) if bound != control => Err(SessionError::HandleMismatch {
            kind,
            bound: bound.raw(),
            requested: control.raw(),
        }),
        _ => {
            *slot = Some(control);
            Ok(())
        }
    }
}

fn flush<U: NativeUi + ?Sized>(
    ui: &mut U,
    config: &DeferConfig,
    mut session: Session,
) -> FlushSummary {
    let mut summary = FlushSummary::default();

    if let Some(list) = session.list {
        ui.set_redraw(list, true);
        ui.force_redraw(list);
    }

    let Some(control) = session.dropdown else {
        return summary;
    };
    if session.entries.is_empty() {
        return summary;
    }

    ui.set_redraw(control, false);
    ui.set_min_visible(control, config.flush_min_visible);

    if ui.has_sort_style(control) {
        sort_for_sorted_control(&mut session.entries);
        summary.sorted = true;
    }

    ui.init_storage(control, session.entries.len(), session.text_length);

    let dc = if session.allow_resize {
        let dc = ui.acquire_dc(control);
        if dc.is_none() {
            warn!(
                "No drawing context for {:#x}, drop width left unchanged",
                control.raw()
            );
        }
        dc
    } else {
        None
    };

    let mut widest = 0;
    for entry in session.entries.drain(..) {
        match ui.add_string(control, &entry.text).index() {
            Some(index) => {
                ui.set_item_data(control, index, entry.value);
                summary.inserted += 1;
            }
            None => summary.failed += 1,
        }

        if let Some(dc) = dc
            && let Some(width) = ui.text_width(dc, &entry.text)
        {
            widest = widest.max(width);
        }
        // `entry` and its text copy are dropped here.
    }

    if let Some(dc) = dc {
        if widest > ui.dropped_width(control) {
            ui.set_dropped_width(control, widest);
            summary.resized_to = Some(widest);
        }
        ui.release_dc(control, dc);
    }

    ui.set_min_visible(control, config.restored_min_visible);
    ui.set_redraw(control, true);
    summary
}
