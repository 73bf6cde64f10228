//! Patch command implementation.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::fs;
use std::path::Path;
use uidefer::{ByteBuffer, CodeView, HookTargets, instrument};

use super::hex_utils::{parse_base, parse_hex_address};
use super::signature_set;

/// Run the patch command
pub fn run(
    dump: &Path,
    base: Option<&str>,
    begin_hook: &str,
    end_hook: &str,
    output: &Path,
    signatures: Option<&Path>,
) -> Result<()> {
    let base = parse_base(base)?;
    let targets = HookTargets {
        begin: parse_hex_address(begin_hook)?,
        end: parse_hex_address(end_hook)?,
    };
    let signatures = signature_set(signatures)?;

    let mut image = ByteBuffer::from_file(dump, base)?;
    let end = image.end_address();
    let report = instrument(&mut image, base, end, &signatures, targets)?;

    fs::write(output, image.as_slice())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Patched {} region(s), {} rejected",
        report.patched.green(),
        report.rejected
    );
    println!("Wrote {}", output.display());

    Ok(())
}
