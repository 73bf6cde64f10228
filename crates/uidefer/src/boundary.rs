//! Process-wide entry points reached from patched code.
//!
//! Patched call sites jump straight into [`begin_hook`] and [`end_hook`],
//! which have no context argument, so the inserter they drive lives in a
//! single process-wide slot. Hooks and insert helpers are no-ops until
//! [`install`] fills it.
//!
//! The slot stays locked while native controls are driven, and some control
//! messages call back into the host before returning. A call that re-enters
//! this module on the same thread is refused with a warning instead of
//! locking the slot a second time.

use std::cell::Cell;
use std::ffi::{CStr, c_char};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::patch::HookTargets;
use crate::session::{DeferConfig, DeferredInserter, FlushSummary};
use crate::ui::{ControlHandle, ItemData, NativeUi};

type SharedUi = Box<dyn NativeUi + Send>;

static INSERTER: Mutex<Option<DeferredInserter<SharedUi>>> = Mutex::new(None);

thread_local! {
    static ENTERED: Cell<bool> = const { Cell::new(false) };
}

/// Marks this thread as inside the slot until dropped.
struct Entered;

impl Entered {
    fn enter() -> Option<Self> {
        if ENTERED.replace(true) {
            None
        } else {
            Some(Entered)
        }
    }
}

impl Drop for Entered {
    fn drop(&mut self) {
        ENTERED.set(false);
    }
}

/// Run `f` on the slot, or `None` when this thread is already inside it.
fn with_slot<R>(f: impl FnOnce(&mut Option<DeferredInserter<SharedUi>>) -> R) -> Option<R> {
    let Some(_entered) = Entered::enter() else {
        warn!("Re-entrant call into deferred insertion ignored");
        return None;
    };
    // A panic mid-flush leaves plain data behind; keep serving hooks.
    let mut slot = INSERTER.lock().unwrap_or_else(PoisonError::into_inner);
    Some(f(&mut slot))
}

fn with_inserter<R>(f: impl FnOnce(&mut DeferredInserter<SharedUi>) -> R) -> Option<R> {
    with_slot(|slot| slot.as_mut().map(f)).flatten()
}

/// Install the controls the hooks forward to, replacing any previous ones.
pub fn install<U: NativeUi + Send + 'static>(ui: U, config: DeferConfig) {
    let inserter = DeferredInserter::with_config(Box::new(ui) as SharedUi, config);
    let Some(previous) = with_slot(|slot| slot.replace(inserter)) else {
        return;
    };
    // Flushed outside the lock.
    if let Some(mut previous) = previous {
        previous.end();
        debug!("Replaced previously installed inserter");
    }
    info!("Deferred insertion hooks installed");
}

/// Remove the installed controls, flushing any open session first.
pub fn uninstall() -> Option<FlushSummary> {
    let mut inserter = with_slot(Option::take).flatten()?;
    Some(inserter.end())
}

pub fn is_installed() -> bool {
    // Re-entry only happens from inside an installed inserter.
    with_slot(|slot| slot.is_some()).unwrap_or(true)
}

/// Addresses the patched call sites are redirected to.
pub fn hook_targets() -> HookTargets {
    HookTargets {
        begin: begin_hook as extern "C" fn() as usize as u64,
        end: end_hook as extern "C" fn() as usize as u64,
    }
}

/// Patched into every region entry.
pub extern "C" fn begin_hook() {
    with_inserter(|inserter| {
        if let Err(e) = inserter.begin() {
            // Nested region: close the outer one so nothing stays buffered.
            warn!("{}; flushing before re-arming", e);
            inserter.end();
            if let Err(e) = inserter.begin() {
                warn!("Failed to re-arm deferred session: {}", e);
            }
        }
    });
}

/// Patched into every region exit.
pub extern "C" fn end_hook() {
    with_inserter(|inserter| inserter.end());
}

/// Drop-down insertion routed through the active session, if any.
///
/// `text` is the host's narrow string and is passed on unchanged.
pub fn insert_dropdown(control: usize, text: Option<&CStr>, value: usize, allow_resize: bool) {
    let handled = with_inserter(|inserter| {
        inserter.request_dropdown_insert(
            ControlHandle::new(control),
            text,
            ItemData(value),
            allow_resize,
        )
    });

    match handled {
        Some(Err(e)) => warn!("Drop-down insert rejected: {}", e),
        None => debug!("Drop-down insert on {:#x} not handled", control),
        Some(Ok(())) => {}
    }
}

/// List insertion; redraw is held while a session is active.
pub fn insert_list(control: usize, value: usize, use_image: bool, index: i32) -> Option<usize> {
    let handled = with_inserter(|inserter| {
        inserter.request_list_insert(ControlHandle::new(control), ItemData(value), use_image, index)
    });

    match handled {
        Some(Ok(index)) => index,
        Some(Err(e)) => {
            warn!("List insert rejected: {}", e);
            None
        }
        None => {
            debug!("List insert on {:#x} not handled", control);
            None
        }
    }
}

/// C ABI replacement for the host's drop-down insertion helper.
///
/// # Safety
///
/// `text` must be null or point to a NUL-terminated string valid for the
/// duration of the call.
pub unsafe extern "C" fn insert_combo_box_item(
    control: usize,
    text: *const c_char,
    value: usize,
    allow_resize: bool,
) {
    let text = if text.is_null() {
        None
    } else {
        // SAFETY: non-null and NUL-terminated per the function contract.
        Some(unsafe { CStr::from_ptr(text) })
    };
    insert_dropdown(control, text, value, allow_resize);
}

/// C ABI replacement for the host's list insertion helper.
pub extern "C" fn insert_list_view_item(control: usize, value: usize, use_image: bool, index: i32) {
    insert_list(control, value, use_image, index);
}

/// Install Win32 controls and patch `[code_base, code_end)` of this process.
///
/// # Safety
///
/// The range must be the mapped code segment of the host executable, and no
/// other thread may be executing it while it is patched.
#[cfg(target_os = "windows")]
pub unsafe fn attach(
    code_base: u64,
    code_end: u64,
    signatures: &crate::scan::SignatureSet,
) -> crate::Result<crate::patch::InstrumentReport> {
    use crate::memory::LoadedModule;
    use crate::ui::Win32Ui;

    install(Win32Ui::new(), DeferConfig::default());
    // SAFETY: forwarded from this function's contract.
    let mut module = unsafe { LoadedModule::from_range(code_base, code_end) };
    crate::patch::instrument(&mut module, code_base, code_end, signatures, hook_targets())
}

/// [`attach`] over the host's fixed code segment with the builtin signatures.
///
/// # Safety
///
/// The host executable must be mapped at its preferred base so that
/// `[DEFAULT_CODE_BASE, DEFAULT_CODE_END)` is its code segment, and no other
/// thread may be executing it while it is patched.
#[cfg(target_os = "windows")]
pub unsafe fn attach_default() -> crate::Result<crate::patch::InstrumentReport> {
    use crate::scan::{DEFAULT_CODE_BASE, DEFAULT_CODE_END, SignatureSet};

    // SAFETY: forwarded from this function's contract.
    unsafe { attach(DEFAULT_CODE_BASE, DEFAULT_CODE_END, &SignatureSet::builtin()) }
}
