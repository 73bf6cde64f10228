//! # uidefer
//!
//! Batches drop-down insertions made inside bracketed regions of a host
//! executable.
//!
//! This crate provides:
//! - Masked byte-pattern scanning over code images
//! - Entry/exit call-site pairing and rel32 call patching
//! - A deferred insertion session that flushes drop-down entries in bulk
//! - Process-wide hook entry points for patched code
//!
//! Win32 backends (`LoadedModule`, `Win32Ui`, `boundary::attach`) are only
//! built on Windows; everything else works on any platform against
//! in-memory code images and test doubles.

pub mod boundary;
pub mod error;
pub mod insert;
pub mod memory;
pub mod patch;
pub mod scan;
pub mod session;
pub mod ui;

pub use error::{Error, Result, SessionError};
#[cfg(target_os = "windows")]
pub use memory::LoadedModule;
pub use memory::{ByteBuffer, CodeView, CodeWriter};
pub use patch::{
    CallShape, CallSite, HookTargets, InstrumentReport, encode_rel_call, instrument,
    write_rel_call,
};
pub use scan::{
    CallSitePair, ExitSignature, ExitVariant, PairingStats, Pattern, SignatureSet, find,
    find_all, find_in_slice, load_signatures, resolve_instrumentation_points,
    resolve_with_stats, save_signatures,
};
pub use session::{DeferConfig, DeferConfigBuilder, DeferredInserter, FlushSummary, SessionState};
pub use ui::{ControlHandle, ControlKind, ItemData, NativeUi};
