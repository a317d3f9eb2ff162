//! Error types for the merge engine

use std::fmt;

use thiserror::Error;
use tm_codec::CodecError;

/// Merge engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Gain vector has {actual} entries, expected {expected}")]
    GainVectorLengthMismatch { expected: usize, actual: usize },

    #[error("Gain #{index} is {value}%, must be 0-100")]
    GainOutOfRange { index: usize, value: u8 },

    #[error("Track #{index} is {actual} Hz, expected {expected} Hz")]
    SampleRateMismatch {
        index: usize,
        expected: u32,
        actual: u32,
    },

    #[error("No tracks loaded")]
    NotLoaded,

    #[error("Nothing to ingest")]
    EmptyBatch,

    #[error("Ingest failed: {0}")]
    IngestFailed(IngestReport),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations
pub type MergeResult<T> = Result<T, MergeError>;

/// One file that could not be ingested
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFailure {
    /// Position in the ingest batch
    pub index: usize,
    pub name: String,
    pub error: CodecError,
}

/// Every failure of an ingest batch, in batch order
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub batch_size: usize,
    pub failures: Vec<TrackFailure>,
}

impl IngestReport {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} files failed",
            self.failures.len(),
            self.batch_size
        )?;
        for failure in &self.failures {
            write!(f, "; #{} '{}': {}", failure.index, failure.name, failure.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display_lists_every_failure() {
        let report = IngestReport {
            batch_size: 3,
            failures: vec![
                TrackFailure {
                    index: 0,
                    name: "a.mp3".to_string(),
                    error: CodecError::UnsupportedFormat("no MPEG audio frame header found".to_string()),
                },
                TrackFailure {
                    index: 2,
                    name: "c.mp3".to_string(),
                    error: CodecError::Truncated {
                        offset: 0,
                        needed: 417,
                        available: 10,
                    },
                },
            ],
        };

        let text = MergeError::IngestFailed(report.clone()).to_string();
        assert!(text.starts_with("Ingest failed: 2 of 3 files failed"));
        assert!(text.contains("#0 'a.mp3'"));
        assert!(text.contains("#2 'c.mp3'"));
        assert_eq!(report.failed_indices(), vec![0, 2]);
    }

    #[test]
    fn test_codec_error_is_transparent() {
        let err: MergeError = CodecError::EncodeError("bad rate".to_string()).into();
        assert_eq!(err.to_string(), "Encoding error: bad rate");
    }
}
