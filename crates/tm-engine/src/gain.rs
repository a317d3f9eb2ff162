//! Per-track gain vector

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, MergeResult};

/// Unity gain in percent
pub const UNITY_PERCENT: u8 = 100;

/// One linear gain per track, in ingestion order, as a percentage
/// (100 = unity, 0 = silence)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainVector {
    percents: Vec<u8>,
}

impl GainVector {
    /// Validate and wrap; values above 100 are rejected, never clamped
    pub fn new(percents: Vec<u8>) -> MergeResult<Self> {
        if let Some((index, &value)) = percents
            .iter()
            .enumerate()
            .find(|(_, p)| **p > UNITY_PERCENT)
        {
            return Err(MergeError::GainOutOfRange { index, value });
        }
        Ok(Self { percents })
    }

    /// Validate against a track count: the length is checked before any
    /// value, so a short vector is a length mismatch even if it also holds an
    /// out-of-range gain
    pub fn for_tracks(percents: Vec<u8>, tracks: usize) -> MergeResult<Self> {
        if percents.len() != tracks {
            return Err(MergeError::GainVectorLengthMismatch {
                expected: tracks,
                actual: percents.len(),
            });
        }
        Self::new(percents)
    }

    /// Every track at 100%
    pub fn unity(tracks: usize) -> Self {
        Self {
            percents: vec![UNITY_PERCENT; tracks],
        }
    }

    pub fn len(&self) -> usize {
        self.percents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percents.is_empty()
    }

    pub fn percents(&self) -> &[u8] {
        &self.percents
    }

    /// Linear factor for track `index`
    pub fn factor(&self, index: usize) -> f32 {
        f32::from(self.percents[index]) / f32::from(UNITY_PERCENT)
    }

    /// Fail unless there is exactly one gain per track
    pub fn check_len(&self, tracks: usize) -> MergeResult<()> {
        if self.len() != tracks {
            return Err(MergeError::GainVectorLengthMismatch {
                expected: tracks,
                actual: self.len(),
            });
        }
        Ok(())
    }
}
