//! Signature scanning over code images.
//!
//! - [`pattern`]: masked byte patterns and the first-match scanner
//! - [`signature`]: entry/exit signature sets, builtin and file-backed
//! - [`pairing`]: entry/exit call-site pairing

mod constants;
mod pairing;
mod pattern;
mod signature;

pub use constants::*;
pub use pairing::*;
pub use pattern::*;
pub use signature::*;

#[cfg(test)]
pub(crate) use pairing::test_support;
