//! Error types for the codec layer

use thiserror::Error;

/// Decode / encode errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Truncated frame at byte {offset}: needs {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Corrupt frame #{frame}: {reason}")]
    CorruptFrame { frame: usize, reason: String },

    #[error("Encoding error: {0}")]
    EncodeError(String),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
