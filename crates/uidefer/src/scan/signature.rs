use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::constants::*;
use super::pattern::Pattern;
use crate::error::Result;

/// Which epilogue form closed a bracketed region.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExitVariant {
    /// Destructor call still present.
    Live,
    /// Destructor call replaced by a 5-byte nop.
    Nopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitSignature {
    pub name: String,
    pub variant: ExitVariant,
    pub pattern: Pattern,
}

/// Entry and exit signatures plus the pairing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    pub entry: Pattern,
    /// Tried in order; the first variant that matches wins.
    pub exits: Vec<ExitSignature>,
    #[serde(default = "default_probe_skip")]
    pub probe_skip: usize,
    #[serde(default = "default_exit_window")]
    pub exit_window: usize,
    #[serde(default)]
    pub excluded: Vec<u64>,
}

fn default_probe_skip() -> usize {
    PROBE_SKIP
}

fn default_exit_window() -> usize {
    EXIT_SEARCH_WINDOW
}

impl SignatureSet {
    /// Signatures for the templated form iterator.
    pub fn builtin() -> Self {
        Self {
            entry: Pattern::from_static(ENTRY_SIGNATURE),
            exits: vec![
                ExitSignature {
                    name: "iterator_dtor".to_string(),
                    variant: ExitVariant::Live,
                    pattern: Pattern::from_static(EXIT_SIGNATURE_LIVE),
                },
                ExitSignature {
                    name: "iterator_dtor_nopped".to_string(),
                    variant: ExitVariant::Nopped,
                    pattern: Pattern::from_static(EXIT_SIGNATURE_NOPPED),
                },
            ],
            probe_skip: PROBE_SKIP,
            exit_window: EXIT_SEARCH_WINDOW,
            excluded: EXCLUDED_PROBES.to_vec(),
        }
    }

    pub fn is_excluded(&self, probe: u64) -> bool {
        self.excluded.contains(&probe)
    }
}

impl Default for SignatureSet {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}
