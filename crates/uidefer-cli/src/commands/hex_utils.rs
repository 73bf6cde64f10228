//! Hex address parsing.

use anyhow::Result;
use uidefer::scan::DEFAULT_CODE_BASE;

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}

/// Parse an optional bound, falling back to `default`.
pub fn parse_bound(s: Option<&str>, default: u64) -> Result<u64> {
    s.map_or(Ok(default), parse_hex_address)
}

/// Load address of a dump; the host's code base unless given.
pub fn parse_base(s: Option<&str>) -> Result<u64> {
    parse_bound(s, DEFAULT_CODE_BASE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_address_with_prefix() {
        assert_eq!(parse_hex_address("0x401000").unwrap(), 0x401000);
        assert_eq!(parse_hex_address("0X401000").unwrap(), 0x401000);
    }

    #[test]
    fn test_parse_hex_address_without_prefix() {
        assert_eq!(parse_hex_address("D22500").unwrap(), 0xD22500);
        assert_eq!(parse_hex_address("14148C1FF").unwrap(), 0x1_4148_C1FF);
    }

    #[test]
    fn test_parse_hex_address_invalid() {
        assert!(parse_hex_address("GHIJK").is_err());
        assert!(parse_hex_address("0x").is_err());
    }

    #[test]
    fn test_parse_base_defaults_to_code_base() {
        assert_eq!(parse_base(None).unwrap(), 0x401000);
        assert_eq!(parse_base(Some("0x140001000")).unwrap(), 0x1_4000_1000);
    }

    #[test]
    fn test_parse_bound_default() {
        assert_eq!(parse_bound(None, 0x1000).unwrap(), 0x1000);
        assert_eq!(parse_bound(Some("0x2000"), 0x1000).unwrap(), 0x2000);
    }
}
