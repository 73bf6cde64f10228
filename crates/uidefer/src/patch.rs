//! Relative-call patching of resolved call sites.
//!
//! A [`CallSite`] can only be obtained by confirming the 5-byte shape at an
//! address, so the writer never touches bytes that were not a call (or the
//! nop that replaced one).

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::memory::{CodeView, CodeWriter};
use crate::scan::{CallSitePair, PairingStats, SignatureSet, resolve_with_stats};

/// Length of `call rel32`.
pub const CALL_LEN: usize = 5;

const CALL_OPCODE: u8 = 0xE8;
/// Lead byte of the 5-byte `nop dword [rax+rax+0]`.
const NOP_OPCODE: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    RelativeCall,
    Nop,
}

/// A confirmed 5-byte call (or nopped call) location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    address: u64,
    shape: CallShape,
}

impl CallSite {
    pub fn confirm<V: CodeView + ?Sized>(view: &V, address: u64) -> Result<Self> {
        let bytes = view.read_bytes(address, CALL_LEN)?;
        let shape = match bytes[0] {
            CALL_OPCODE => CallShape::RelativeCall,
            NOP_OPCODE => CallShape::Nop,
            opcode => return Err(Error::NotACallSite { address, opcode }),
        };
        Ok(Self { address, shape })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }

    /// Target of the live call, `None` for a nop.
    pub fn current_target<V: CodeView + ?Sized>(&self, view: &V) -> Result<Option<u64>> {
        if self.shape == CallShape::Nop {
            return Ok(None);
        }
        let disp = view.read_i32(self.address + 1)?;
        Ok(Some(self.next_ip().wrapping_add_signed(disp as i64)))
    }

    /// `target - (site + 5)`, checked against the rel32 range.
    pub fn displacement_to(&self, target: u64) -> Result<i32> {
        let delta = target as i128 - self.next_ip() as i128;
        i32::try_from(delta).map_err(|_| Error::DisplacementOutOfRange {
            site: self.address,
            target,
        })
    }

    fn next_ip(&self) -> u64 {
        self.address + CALL_LEN as u64
    }
}

/// Encode `call target` for `site`.
pub fn encode_rel_call(site: &CallSite, target: u64) -> Result<[u8; CALL_LEN]> {
    let disp = site.displacement_to(target)?.to_le_bytes();
    Ok([CALL_OPCODE, disp[0], disp[1], disp[2], disp[3]])
}

/// Overwrite `site` with `call target`. Not reverted.
pub fn write_rel_call<W: CodeWriter + ?Sized>(
    writer: &mut W,
    site: &CallSite,
    target: u64,
) -> Result<()> {
    let encoded = encode_rel_call(site, target)?;
    writer.write_bytes(site.address, &encoded)
}

/// Absolute addresses of the begin/end hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HookTargets {
    pub begin: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstrumentReport {
    pub pairs: Vec<CallSitePair>,
    pub stats: PairingStats,
    pub patched: usize,
    /// Pairs skipped because a site did not have the call shape or a hook
    /// was out of rel32 range.
    pub rejected: usize,
}

/// Resolve all pairs in `[code_base, code_end)` and redirect them to the hooks.
///
/// Both sites of a pair are confirmed and encoded before either is written,
/// so a pair is patched completely or not at all. Pairs that cannot be
/// encoded are counted as rejected; only write failures abort.
pub fn instrument<I: CodeView + CodeWriter + ?Sized>(
    image: &mut I,
    code_base: u64,
    code_end: u64,
    signatures: &SignatureSet,
    targets: HookTargets,
) -> Result<InstrumentReport> {
    let (pairs, stats) = resolve_with_stats(&*image, code_base, code_end, signatures);
    let mut report = InstrumentReport {
        stats,
        ..Default::default()
    };

    for pair in pairs {
        let calls = match encode_pair(&*image, &pair, targets) {
            Ok(calls) => calls,
            Err(e) => {
                warn!("Skipping pair {:#x} -> {:#x}: {}", pair.entry, pair.exit, e);
                report.rejected += 1;
                continue;
            }
        };

        for (address, call) in calls {
            image.write_bytes(address, &call)?;
        }

        debug!("Patched {:#x} -> {:#x}", pair.entry, pair.exit);
        report.patched += 1;
        report.pairs.push(pair);
    }

    info!(
        "Instrumented {} bracketed regions ({} rejected)",
        report.patched, report.rejected
    );
    Ok(report)
}

fn encode_pair<V: CodeView + ?Sized>(
    view: &V,
    pair: &CallSitePair,
    targets: HookTargets,
) -> Result<[(u64, [u8; CALL_LEN]); 2]> {
    let begin = CallSite::confirm(view, pair.entry)?;
    let end = CallSite::confirm(view, pair.exit)?;
    Ok([
        (begin.address(), encode_rel_call(&begin, targets.begin)?),
        (end.address(), encode_rel_call(&end, targets.end)?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ByteBuffer, MockCodeBuilder};
    use crate::scan::test_support::*;

    const BASE: u64 = 0x40_1000;

    #[test]
    fn test_confirm_shapes() {
        let view = ByteBuffer::new(0x100, vec![0xE8, 0, 0, 0, 0, 0x0F, 0x1F, 0x44, 0, 0, 0x90]);
        assert_eq!(
            CallSite::confirm(&view, 0x100).unwrap().shape(),
            CallShape::RelativeCall
        );
        assert_eq!(CallSite::confirm(&view, 0x105).unwrap().shape(), CallShape::Nop);
        assert!(matches!(
            CallSite::confirm(&view, 0x10A),
            Err(Error::MemoryReadFailed { .. })
        ));

        let view = ByteBuffer::new(0, vec![0x90; 5]);
        assert!(matches!(
            CallSite::confirm(&view, 0),
            Err(Error::NotACallSite { opcode: 0x90, .. })
        ));
    }

    #[test]
    fn test_displacement() {
        let view = ByteBuffer::new(0x1000, vec![0xE8, 0, 0, 0, 0]);
        let site = CallSite::confirm(&view, 0x1000).unwrap();
        assert_eq!(site.displacement_to(0x2000).unwrap(), 0x2000 - 0x1005);
        assert_eq!(site.displacement_to(0x1000).unwrap(), -5);
        assert!(matches!(
            site.displacement_to(0x1_0000_1005),
            Err(Error::DisplacementOutOfRange { .. })
        ));
    }

    #[test]
    fn test_write_rel_call_redirects_target() {
        let mut image = ByteBuffer::new(0x1000, vec![0x0F, 0x1F, 0x44, 0x00, 0x00, 0xC3]);
        let site = CallSite::confirm(&image, 0x1000).unwrap();
        assert_eq!(site.current_target(&image).unwrap(), None);

        write_rel_call(&mut image, &site, 0x800).unwrap();

        let site = CallSite::confirm(&image, 0x1000).unwrap();
        assert_eq!(site.shape(), CallShape::RelativeCall);
        assert_eq!(site.current_target(&image).unwrap(), Some(0x800));
        assert_eq!(image.as_slice()[5], 0xC3);
    }

    #[test]
    fn test_instrument_patches_both_sites() {
        let (builder, begin, end) = region(MockCodeBuilder::new(BASE).padding(8), 40, &EXIT_NOPPED);
        let mut image = builder.padding(8).build();
        let targets = HookTargets {
            begin: BASE + 0x10_0000,
            end: BASE + 0x10_0100,
        };

        let end_address = image.end_address();
        let report = instrument(
            &mut image,
            BASE,
            end_address,
            &SignatureSet::builtin(),
            targets,
        )
        .unwrap();

        assert_eq!(report.patched, 1);
        assert_eq!(report.rejected, 0);
        let begin_site = CallSite::confirm(&image, begin).unwrap();
        let end_site = CallSite::confirm(&image, end).unwrap();
        assert_eq!(begin_site.current_target(&image).unwrap(), Some(targets.begin));
        assert_eq!(end_site.current_target(&image).unwrap(), Some(targets.end));
    }

    #[test]
    fn test_instrument_rejects_non_call_begin_site() {
        // Probe byte is a plain nop, not a call: the pair is left untouched.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ENTRY);
        bytes.extend_from_slice(&SKIP);
        bytes.extend_from_slice(&[0x90; 5]);
        bytes.extend_from_slice(&EXIT_LIVE);
        let mut image = ByteBuffer::new(BASE, bytes);
        let before = image.clone();
        let end_address = image.end_address();

        let report = instrument(
            &mut image,
            BASE,
            end_address,
            &SignatureSet::builtin(),
            HookTargets {
                begin: BASE,
                end: BASE,
            },
        )
        .unwrap();

        assert_eq!(report.rejected, 1);
        assert_eq!(report.patched, 0);
        assert_eq!(image, before);
    }

    #[test]
    fn test_instrument_rejects_out_of_range_hook_and_continues() {
        let (builder, first_begin, first_end) =
            region(MockCodeBuilder::new(BASE).padding(8), 40, &EXIT_LIVE);
        let (builder, second_begin, second_end) = region(builder.padding(8), 40, &EXIT_LIVE);
        let mut image = builder.padding(8).build();
        let before = image.clone();

        // Exactly i32::MAX from the second begin site, one byte too far for the first.
        let targets = HookTargets {
            begin: second_begin + CALL_LEN as u64 + i32::MAX as u64,
            end: BASE,
        };
        let end_address = image.end_address();
        let report = instrument(
            &mut image,
            BASE,
            end_address,
            &SignatureSet::builtin(),
            targets,
        )
        .unwrap();

        assert_eq!(report.rejected, 1);
        assert_eq!(report.patched, 1);
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].entry, second_begin);

        for site in [first_begin, first_end] {
            let at = (site - BASE) as usize;
            assert_eq!(
                image.as_slice()[at..at + CALL_LEN],
                before.as_slice()[at..at + CALL_LEN]
            );
        }
        let begin_site = CallSite::confirm(&image, second_begin).unwrap();
        let end_site = CallSite::confirm(&image, second_end).unwrap();
        assert_eq!(begin_site.current_target(&image).unwrap(), Some(targets.begin));
        assert_eq!(end_site.current_target(&image).unwrap(), Some(BASE));
    }
}
