//! Header-based duration estimation
//!
//! Reads one frame header instead of decoding: skip a leading ID3v2 tag,
//! find the first frame, take its bitrate and divide the file size by it.
//!
//! The estimate is exact only for constant-bitrate files. Variable-bitrate
//! files are estimated from the first frame's bitrate alone; callers wanting
//! the exact figure can walk every header with
//! [`StreamSummary`](crate::scan::StreamSummary) instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scan;

/// Estimated playback duration
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct EstimatedDuration {
    seconds: f64,
}

impl EstimatedDuration {
    pub const ZERO: Self = Self { seconds: 0.0 };

    /// Negative and non-finite inputs become zero
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self { seconds }
        } else {
            Self::ZERO
        }
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0.0
    }

    /// Whole hours, minutes, seconds (truncated, no rounding)
    pub fn as_hms(&self) -> (u64, u64, u64) {
        let total_secs = self.seconds as u64;
        (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60)
    }
}

impl fmt::Display for EstimatedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, mins, secs) = self.as_hms();
        write!(f, "{:02}:{:02}:{:02}", hours, mins, secs)
    }
}

/// Estimate the duration of `bytes`, whose on-disk size is `byte_len`.
///
/// `byte_len` is usually `bytes.len()`; it is separate so a caller holding
/// only the head of a file can still estimate the whole. Returns zero when no
/// frame header is found.
pub fn estimate_duration(bytes: &[u8], byte_len: u64) -> EstimatedDuration {
    match scan::first_frame(bytes) {
        Some((offset, header)) => {
            let seconds = (byte_len as f64 * 8.0) / header.bitrate_bps() as f64;
            log::debug!(
                "Duration estimate: first frame at {} ({} kbps), {} bytes -> {:.3}s",
                offset,
                header.bitrate_kbps,
                byte_len,
                seconds
            );
            EstimatedDuration::from_seconds(seconds)
        }
        None => {
            log::warn!("No frame header in {} bytes, duration unknown", bytes.len());
            EstimatedDuration::ZERO
        }
    }
}
