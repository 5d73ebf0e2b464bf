//! Relay (boundary channel) errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Relay unavailable: {0}")]
    Unavailable(String),

    #[error("Relay closed")]
    Closed,

    #[error("Message too large: {size} bytes, max {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_error() {
        let err = RelayError::Unavailable("no receiver".to_string());
        let display = err.to_string();
        assert!(display.contains("unavailable"));
        assert!(display.contains("no receiver"));
    }

    #[test]
    fn test_message_too_large_error() {
        let err = RelayError::MessageTooLarge {
            size: 2_000_000,
            max: 1_048_576,
        };
        let display = err.to_string();
        assert!(display.contains("too large"));
        assert!(display.contains("2000000"));
        assert!(display.contains("1048576"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = RelayError::from(io_err);
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_closed_debug() {
        let debug = format!("{:?}", RelayError::Closed);
        assert!(debug.contains("Closed"));
    }
}
