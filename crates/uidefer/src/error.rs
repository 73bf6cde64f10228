use thiserror::Error;

use crate::ui::ControlKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read code at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write code at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Address {address:#x} does not hold a 5-byte call site (opcode {opcode:#04x})")]
    NotACallSite { address: u64, opcode: u8 },

    #[error("Hook target {target:#x} is out of rel32 range from call site {site:#x}")]
    DisplacementOutOfRange { site: u64, target: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Contract violations reported by the deferred session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Deferred session already active ({pending} pending entries, list bound: {list_bound})")]
    AlreadyActive { pending: usize, list_bound: bool },

    #[error("Session is bound to {kind} {bound:#x} but got {requested:#x}")]
    HandleMismatch {
        kind: ControlKind,
        bound: usize,
        requested: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.is_not_found());

        let err2 = Error::InvalidPattern("empty".to_string());
        assert!(!err2.is_not_found());
    }

    #[test]
    fn test_handle_mismatch_message() {
        let err = SessionError::HandleMismatch {
            kind: ControlKind::Dropdown,
            bound: 0x10,
            requested: 0x20,
        };
        assert_eq!(err.to_string(), "Session is bound to drop-down 0x10 but got 0x20");
    }

    #[test]
    fn test_call_site_message_shows_opcode() {
        let err = Error::NotACallSite {
            address: 0x401000,
            opcode: 0x90,
        };
        assert_eq!(
            err.to_string(),
            "Address 0x401000 does not hold a 5-byte call site (opcode 0x90)"
        );
    }
}
