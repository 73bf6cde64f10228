//! Signatures command implementation.

use anyhow::Result;
use std::path::Path;
use uidefer::SignatureSet;

/// Run the signatures command
pub fn run(output: Option<&Path>) -> Result<()> {
    let signatures = SignatureSet::builtin();

    match output {
        Some(path) => {
            uidefer::save_signatures(path, &signatures)?;
            println!("Saved builtin signatures to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&signatures)?),
    }

    Ok(())
}
