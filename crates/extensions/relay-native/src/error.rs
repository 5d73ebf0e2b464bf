//! Frame decoding errors.

use thiserror::Error;

/// Errors raised while reading a framed stream.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Truncated frame, oversized length prefix or an underlying read failure.
    #[error("Frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame {index} is not valid JSON: {source}")]
    Json {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}
