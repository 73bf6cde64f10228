//! Scan command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;
use uidefer::{ByteBuffer, CodeView, ExitVariant, resolve_with_stats};

use super::hex_utils::{parse_base, parse_bound};
use super::signature_set;

/// Run the scan command
pub fn run(
    dump: &Path,
    base: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
    signatures: Option<&Path>,
    json: bool,
) -> Result<()> {
    let base = parse_base(base)?;
    let image = ByteBuffer::from_file(dump, base)?;
    let start = parse_bound(start, image.base_address())?;
    let end = parse_bound(end, image.end_address())?;
    let signatures = signature_set(signatures)?;

    let (pairs, stats) = resolve_with_stats(&image, start, end, &signatures);

    if json {
        let output = serde_json::json!({
            "range": { "start": start, "end": end },
            "pairs": pairs,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Scanned 0x{:X} - 0x{:X} ({} bytes)",
        start,
        end,
        end.saturating_sub(start)
    );
    println!();
    println!("{:>4}  {:<14} {:<14} {}", "#", "begin", "end", "variant");

    for (i, pair) in pairs.iter().enumerate() {
        let variant = match pair.exit_variant {
            ExitVariant::Live => pair.exit_variant.green().to_string(),
            ExitVariant::Nopped => pair.exit_variant.yellow().to_string(),
        };
        println!(
            "{:>4}  0x{:<12X} 0x{:<12X} {}",
            i + 1,
            pair.entry,
            pair.exit,
            variant
        );
    }

    println!();
    println!(
        "{} entries, {} paired, {} unmatched, {} excluded, {} shared exit",
        stats.entries,
        stats.paired.bold(),
        stats.unmatched,
        stats.excluded,
        stats.shared_exit
    );
    if stats.unmatched > 0 {
        println!(
            "{}",
            "Some entries had no exit within the search window".yellow()
        );
    }

    Ok(())
}
