//! Builtin signatures for the templated form iterator.
//!
//! # Layout
//!
//! ```text
//! E8 ?? ?? ?? ??          call  <form iterator getter>
//! 48 89 44 24 30          mov   [rsp+30h], rax
//! 48 8B 44 24 30          mov   rax, [rsp+30h]
//! 48 89 44 24 38          mov   [rsp+38h], rax
//! 48 8B 54 24 38          mov   rdx, [rsp+38h]
//! 48 8D 4C 24 28          lea   rcx, [rsp+28h]
//! .. 11 bytes ..
//! E8 ?? ?? ?? ??          call  <iterator ctor>      <- begin hook
//! ...
//! E8 ?? ?? ?? ??          call  <iterator dtor>      <- end hook
//! 48 81 C4 ?? ?? ?? ??    add   rsp, imm32
//! C3                      ret
//! ```
//!
//! The dtor call may already be replaced by a 5-byte `0F 1F ..` nop, so the
//! exit has a second variant keyed on the `0F` lead byte.

/// Entry signature: call followed by the iterator spill sequence.
pub const ENTRY_SIGNATURE: &[Option<u8>] = &[
    Some(0xE8),
    None,
    None,
    None,
    None, // call rel32
    Some(0x48),
    Some(0x89),
    Some(0x44),
    Some(0x24),
    Some(0x30), // mov [rsp+30h], rax
    Some(0x48),
    Some(0x8B),
    Some(0x44),
    Some(0x24),
    Some(0x30), // mov rax, [rsp+30h]
    Some(0x48),
    Some(0x89),
    Some(0x44),
    Some(0x24),
    Some(0x38), // mov [rsp+38h], rax
    Some(0x48),
    Some(0x8B),
    Some(0x54),
    Some(0x24),
    Some(0x38), // mov rdx, [rsp+38h]
    Some(0x48),
    Some(0x8D),
    Some(0x4C),
    Some(0x24),
    Some(0x28), // lea rcx, [rsp+28h]
];

/// Live destructor call followed by the frame epilogue.
pub const EXIT_SIGNATURE_LIVE: &[Option<u8>] = &[
    Some(0xE8),
    None,
    None,
    None,
    None, // call rel32
    Some(0x48),
    Some(0x81),
    Some(0xC4),
    None,
    None,
    None,
    None, // add rsp, imm32
    Some(0xC3), // ret
];

/// Same epilogue with the destructor call replaced by a 5-byte nop.
pub const EXIT_SIGNATURE_NOPPED: &[Option<u8>] = &[
    Some(0x0F),
    None,
    None,
    None,
    None, // nop dword [rax+rax+0]
    Some(0x48),
    Some(0x81),
    Some(0xC4),
    None,
    None,
    None,
    None, // add rsp, imm32
    Some(0xC3), // ret
];

/// Distance from the end of the entry match to the begin-hook call site.
pub const PROBE_SKIP: usize = 11;

/// Forward search bound for the exit signature, measured from the probe.
pub const EXIT_SEARCH_WINDOW: usize = 1000;

/// Probe addresses whose regions nest more than one list view.
pub const EXCLUDED_PROBES: &[u64] = &[
    0x1_4148_C1FF, // "Use Info" dialog
    0x1_4169_DFAD, // adding a faction to an NPC
];

/// Code segment bounds scanned by default.
pub const DEFAULT_CODE_BASE: u64 = 0x40_1000;
pub const DEFAULT_CODE_END: u64 = 0xD2_2500;
