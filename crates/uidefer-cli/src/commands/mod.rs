//! CLI command implementations.

pub mod find;
pub mod hex_utils;
pub mod patch;
pub mod scan;
pub mod signatures;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use uidefer::SignatureSet;

/// Signature set from `path`, or the builtin one.
pub(crate) fn signature_set(path: Option<&Path>) -> Result<SignatureSet> {
    match path {
        Some(path) => {
            let set = uidefer::load_signatures(path)
                .with_context(|| format!("Failed to load signatures from {}", path.display()))?;
            info!("Loaded signatures from {}", path.display());
            Ok(set)
        }
        None => Ok(SignatureSet::builtin()),
    }
}
