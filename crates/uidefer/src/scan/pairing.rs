//! Entry/exit call-site pairing.
//!
//! Every entry signature hit yields a probe address (the begin-hook call
//! site). A bounded forward search from the probe looks for one of the exit
//! variants (the end-hook call site). Unpaired entries are dropped; the
//! patterns are permissive on purpose, so only bracket balance matters.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use super::pattern::find;
use super::signature::{ExitVariant, SignatureSet};
use crate::memory::CodeView;

/// Begin/end call sites delimiting one bracketed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallSitePair {
    pub entry: u64,
    pub exit: u64,
    pub exit_variant: ExitVariant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairingStats {
    /// Entry signature hits.
    pub entries: usize,
    /// Entries with no exit inside the window.
    pub unmatched: usize,
    /// Entries whose probe is on the exclusion list.
    pub excluded: usize,
    /// Entries whose exit was already claimed by an earlier entry.
    pub shared_exit: usize,
    pub paired: usize,
}

/// Resolve every begin/end pair in `[code_base, code_end)`.
pub fn resolve_instrumentation_points<V: CodeView + ?Sized>(
    view: &V,
    code_base: u64,
    code_end: u64,
    signatures: &SignatureSet,
) -> Vec<CallSitePair> {
    resolve_with_stats(view, code_base, code_end, signatures).0
}

pub fn resolve_with_stats<V: CodeView + ?Sized>(
    view: &V,
    code_base: u64,
    code_end: u64,
    signatures: &SignatureSet,
) -> (Vec<CallSitePair>, PairingStats) {
    let mut pairs = Vec::new();
    let mut stats = PairingStats::default();
    let mut claimed_exits = HashSet::new();
    let mut cursor = code_base;

    debug!(
        "Scanning {:#x}..{:#x} for entry signature ({} bytes)",
        code_base,
        code_end,
        signatures.entry.len()
    );

    while cursor < code_end {
        let Some(hit) = find(view, cursor, code_end, &signatures.entry) else {
            break;
        };
        // Next search starts one byte in, so adjacent hits are still seen.
        cursor = hit + 1;
        stats.entries += 1;

        // `probe_skip` may come from a signature file; overflow means "past the end".
        let probe = (signatures.entry.len() as u64)
            .checked_add(signatures.probe_skip as u64)
            .and_then(|skip| hit.checked_add(skip))
            .filter(|&probe| probe < code_end);
        let Some(probe) = probe else {
            debug!("  Entry {:#x}: probe lies past the code range", hit);
            stats.unmatched += 1;
            continue;
        };

        let window = (code_end - probe).min(signatures.exit_window as u64);
        let exit = signatures.exits.iter().find_map(|sig| {
            find(view, probe, probe + window, &sig.pattern).map(|addr| (addr, sig.variant))
        });

        let Some((exit, exit_variant)) = exit else {
            debug!("  Entry {:#x}: no exit within {} bytes", hit, window);
            stats.unmatched += 1;
            continue;
        };

        if signatures.is_excluded(probe) {
            debug!("  Entry {:#x}: probe {:#x} is excluded", hit, probe);
            stats.excluded += 1;
            continue;
        }

        // A second begin for the same end would leave the brackets unbalanced.
        if !claimed_exits.insert(exit) {
            debug!("  Entry {:#x}: exit {:#x} already paired", hit, exit);
            stats.shared_exit += 1;
            continue;
        }

        debug!("  Pair {:#x} -> {:#x} ({})", probe, exit, exit_variant);
        pairs.push(CallSitePair {
            entry: probe,
            exit,
            exit_variant,
        });
    }

    stats.paired = pairs.len();
    info!(
        "Resolved {} call-site pairs from {} entry hits ({} unmatched, {} excluded, {} shared exit)",
        stats.paired, stats.entries, stats.unmatched, stats.excluded, stats.shared_exit
    );

    (pairs, stats)
}
