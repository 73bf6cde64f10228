//! Masked byte patterns and the first-match scanner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::memory::CodeView;

/// Byte pattern with a parallel wildcard mask.
///
/// `mask[i] == false` means the byte at offset `i` is "don't care". Pattern
/// and mask always have the same, non-zero length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    bytes: Vec<u8>,
    mask: Vec<bool>,
}

impl Pattern {
    pub fn new(bytes: Vec<u8>, mask: Vec<bool>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("Pattern is empty".to_string()));
        }
        if bytes.len() != mask.len() {
            return Err(Error::InvalidPattern(format!(
                "Pattern has {} bytes but mask has {} entries",
                bytes.len(),
                mask.len()
            )));
        }
        Ok(Self { bytes, mask })
    }

    /// Build from raw bytes and an `x`/`?` mask string (`x` = exact).
    pub fn from_code_style(bytes: &[u8], mask: &str) -> Result<Self> {
        let mask = mask
            .chars()
            .map(|c| match c {
                'x' | 'X' => Ok(true),
                '?' => Ok(false),
                other => Err(Error::InvalidPattern(format!(
                    "Invalid mask character '{}'",
                    other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(bytes.to_vec(), mask)
    }

    /// Build from `Some(byte)` / `None` (wildcard) tokens.
    pub fn from_options(tokens: &[Option<u8>]) -> Result<Self> {
        let bytes = tokens.iter().map(|t| t.unwrap_or(0)).collect();
        let mask = tokens.iter().map(Option::is_some).collect();
        Self::new(bytes, mask)
    }

    /// Builtin signature tables; non-empty by construction.
    pub(crate) fn from_static(tokens: &'static [Option<u8>]) -> Self {
        debug_assert!(!tokens.is_empty());
        Self {
            bytes: tokens.iter().map(|t| t.unwrap_or(0)).collect(),
            mask: tokens.iter().map(Option::is_some).collect(),
        }
    }

    /// Parse the `"E8 ?? ?? 48"` text form.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        for token in text.split_whitespace() {
            if token == "??" || token == "?" {
                tokens.push(None);
                continue;
            }

            let value = u8::from_str_radix(token, 16).map_err(|e| {
                Error::InvalidPattern(format!("Invalid pattern token '{}': {}", token, e))
            })?;
            tokens.push(Some(value));
        }
        Self::from_options(&tokens)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Check a window of exactly `self.len()` bytes.
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() == self.bytes.len()
            && window
                .iter()
                .zip(self.bytes.iter().zip(&self.mask))
                .all(|(actual, (expected, exact))| !exact || actual == expected)
    }

    /// First exact byte, used to skip ahead with `memchr`.
    fn anchor(&self) -> Option<(usize, u8)> {
        self.mask
            .iter()
            .position(|&exact| exact)
            .map(|offset| (offset, self.bytes[offset]))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (byte, exact)) in self.bytes.iter().zip(&self.mask).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if *exact {
                write!(f, "{:02X}", byte)?;
            } else {
                f.write_str("??")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pattern {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.to_string()
    }
}

/// Offset of the first match of `pattern` in `haystack`.
pub fn find_in_slice(haystack: &[u8], pattern: &Pattern) -> Option<usize> {
    if haystack.len() < pattern.len() {
        return None;
    }
    let last = haystack.len() - pattern.len();

    let Some((offset, byte)) = pattern.anchor() else {
        // All wildcards: the first window matches.
        return Some(0);
    };

    let mut pos = 0;
    while pos <= last {
        let hit = memchr::memchr(byte, &haystack[pos + offset..=last + offset])?;
        let candidate = pos + hit;
        if pattern.matches(&haystack[candidate..candidate + pattern.len()]) {
            return Some(candidate);
        }
        pos = candidate + 1;
    }

    None
}

/// Address of the first match of `pattern` in `[start, end)`.
///
/// The range is clamped to the view. A match must lie entirely inside the
/// range, so nothing past `end - pattern.len()` is ever compared.
pub fn find<V: CodeView + ?Sized>(
    view: &V,
    start: u64,
    end: u64,
    pattern: &Pattern,
) -> Option<u64> {
    let start = start.max(view.base_address());
    let end = end.min(view.end_address());
    if start >= end || end - start < pattern.len() as u64 {
        return None;
    }

    let haystack = view.read_bytes(start, (end - start) as usize).ok()?;
    find_in_slice(haystack, pattern).map(|offset| start + offset as u64)
}

/// Every match of `pattern` in `[start, end)`, overlapping matches included.
pub fn find_all<V: CodeView + ?Sized>(
    view: &V,
    start: u64,
    end: u64,
    pattern: &Pattern,
) -> Vec<u64> {
    let mut results = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let Some(addr) = find(view, cursor, end, pattern) else {
            break;
        };
        results.push(addr);
        cursor = addr + 1;
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ByteBuffer, MockCodeBuilder};

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let pattern = Pattern::parse("48 8D 0D ?? ?? ?? ??").unwrap();
        assert_eq!(pattern.len(), 7);
        assert_eq!(&pattern.bytes()[..3], &[0x48, 0x8D, 0x0D]);
        assert_eq!(pattern.mask(), &[true, true, true, false, false, false, false]);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Pattern::parse("").is_err());
        assert!(Pattern::parse("48 ZZ").is_err());
        assert!(Pattern::new(vec![1, 2], vec![true]).is_err());
        assert!(Pattern::from_code_style(b"\xE8\x00", "x!").is_err());
    }

    #[test]
    fn test_code_style_matches_text_form() {
        let code = Pattern::from_code_style(b"\xE8\x00\x00\x00\x00\xC3", "x????x").unwrap();
        let text = Pattern::parse("E8 ?? ?? ?? ?? C3").unwrap();
        assert_eq!(code, text);
        assert_eq!(code.to_string(), "E8 ?? ?? ?? ?? C3");
    }

    #[test]
    fn test_serde_uses_text_form() {
        let pattern = Pattern::parse("0F ?? C3").unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, "\"0F ?? C3\"");
        assert!(serde_json::from_str::<Pattern>("\"0F GG\"").is_err());
    }

    #[test]
    fn test_find_single_planted_occurrence() {
        let pattern = Pattern::parse("E8 ?? ?? ?? ?? 48 81 C4").unwrap();
        let mut planted = 0;
        let view = MockCodeBuilder::new(0x1000)
            .padding(37)
            .plant(&[0xE8, 1, 2, 3, 4, 0x48, 0x81, 0xC4], &mut planted)
            .padding(20)
            .build();

        assert_eq!(planted, 0x1000 + 37);
        assert_eq!(find(&view, 0x1000, view.end_address(), &pattern), Some(planted));
    }

    #[test]
    fn test_find_zero_occurrences() {
        let pattern = Pattern::parse("E8 ?? ?? ?? ?? C3").unwrap();
        let view = MockCodeBuilder::new(0x1000)
            .padding(64)
            .bytes(&[0xE8, 0, 0, 0, 0, 0xC2])
            .build();
        assert_eq!(find(&view, 0x1000, view.end_address(), &pattern), None);
    }

    #[test]
    fn test_wildcard_matches_literal_pattern_byte() {
        // The stored byte under a wildcard is 0x00; 0x00 in memory must match too.
        let pattern = Pattern::parse("E8 ?? C3").unwrap();
        let view = ByteBuffer::new(0, vec![0xE8, 0x00, 0xC3]);
        assert_eq!(find(&view, 0, 3, &pattern), Some(0));

        let view = ByteBuffer::new(0, vec![0xE8, 0xFF, 0xC3]);
        assert_eq!(find(&view, 0, 3, &pattern), Some(0));
    }

    #[test]
    fn test_find_does_not_match_across_range_end() {
        let pattern = Pattern::parse("AA BB CC").unwrap();
        let view = ByteBuffer::new(0x100, vec![0x00, 0xAA, 0xBB, 0xCC]);
        assert_eq!(find(&view, 0x100, 0x103, &pattern), None);
        assert_eq!(find(&view, 0x100, 0x104, &pattern), Some(0x101));
    }

    #[test]
    fn test_find_starts_at_cursor() {
        let pattern = Pattern::parse("AA").unwrap();
        let view = ByteBuffer::new(0, vec![0xAA, 0x00, 0xAA]);
        assert_eq!(find(&view, 1, 3, &pattern), Some(2));
    }

    #[test]
    fn test_find_all_overlapping() {
        let pattern = Pattern::parse("AA ?? AA").unwrap();
        let view = ByteBuffer::new(0x10, vec![0xAA, 0x01, 0xAA, 0x02, 0xAA]);
        assert_eq!(find_all(&view, 0x10, 0x15, &pattern), vec![0x10, 0x12]);
    }

    #[test]
    fn test_leading_wildcards_anchor_on_first_exact_byte() {
        let pattern = Pattern::parse("?? ?? 90").unwrap();
        let view = ByteBuffer::new(0, vec![0x90, 0x11, 0x22, 0x90]);
        assert_eq!(find_in_slice(view.as_slice(), &pattern), Some(1));
    }
}
