//! Find command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;
use uidefer::{ByteBuffer, CodeView, Pattern, find};

use super::hex_utils::parse_base;

const CONTEXT_BYTES: usize = 16;

/// Run the find command
pub fn run(dump: &Path, base: Option<&str>, pattern: &str, limit: usize) -> Result<()> {
    let base = parse_base(base)?;
    let pattern = Pattern::parse(pattern)?;
    let image = ByteBuffer::from_file(dump, base)?;
    let end = image.end_address();

    println!("Searching for pattern: {} ({} bytes)", pattern, pattern.len());
    println!("Search range: 0x{:X} - 0x{:X}", base, end);
    println!();

    let mut found = 0;
    let mut cursor = base;
    while found < limit
        && let Some(address) = find(&image, cursor, end, &pattern)
    {
        found += 1;
        println!("[{}] {}", found, format!("0x{:X}", address).cyan());

        let len = CONTEXT_BYTES.min((end - address) as usize);
        if let Ok(context) = image.read_bytes(address, len) {
            let hex: Vec<String> = context.iter().map(|b| format!("{:02X}", b)).collect();
            println!("     {}", hex.join(" "));
        }

        cursor = address + 1;
    }

    println!();
    println!("Found {} result(s)", found);
    if found >= limit {
        println!("(limit reached, use --limit to increase)");
    }

    Ok(())
}
