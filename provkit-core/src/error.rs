//! Error types for provkit-core

/// Result type alias for provkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown command code
    #[error("Unknown command code: {0:#04X}")]
    UnknownCommand(u8),

    /// Parameter value cannot be framed as a data line
    #[error("Invalid parameter value \"{0}\": line terminators are not allowed")]
    InvalidValue(String),

    /// Timeout waiting for response
    #[error("Timeout waiting for response after {millis}ms")]
    Timeout {
        millis: u64,
    },
}

impl Error {
    /// Check if error is recoverable (retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::UnknownCommand(b'Z').to_string(),
            "Unknown command code: 0x5A"
        );
        assert_eq!(
            Error::Timeout { millis: 1500 }.to_string(),
            "Timeout waiting for response after 1500ms"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::Timeout { millis: 10 }.is_recoverable());
        assert!(!Error::UnknownCommand(0).is_recoverable());
    }
}
