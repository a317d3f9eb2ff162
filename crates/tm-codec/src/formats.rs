//! Output format definitions

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::header::MpegVersion;

/// Sample rates an MPEG audio stream can carry
pub const SUPPORTED_SAMPLE_RATES: [u32; 9] =
    [8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000];

/// Highest channel count an MPEG audio stream can carry
pub const MAX_CHANNELS: usize = 2;

/// Highest Layer III bitrate for MPEG-2/2.5 sample rates
const MPEG2_MAX_KBPS: u32 = 160;

/// MP3 encoder configuration.
///
/// Output is always constant bitrate so the header-based duration estimate
/// of an engine result is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mp3Config {
    /// Constant bitrate in kbps
    pub bitrate_kbps: u32,
    /// Algorithm quality (0 = best/slowest, 9 = worst/fastest)
    pub quality: u8,
}

impl Default for Mp3Config {
    fn default() -> Self {
        Self {
            bitrate_kbps: 192,
            quality: 5,
        }
    }
}

impl Mp3Config {
    /// 320 kbps, near-best quality
    pub fn high_quality() -> Self {
        Self {
            bitrate_kbps: 320,
            quality: 2,
        }
    }

    /// 128 kbps, fast encode for live preview
    pub fn preview() -> Self {
        Self {
            bitrate_kbps: 128,
            quality: 7,
        }
    }

    /// Set bitrate
    pub fn with_bitrate(mut self, kbps: u32) -> Self {
        self.bitrate_kbps = kbps;
        self
    }

    /// Set algorithm quality
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(9);
        self
    }

    /// Bitrate to request for a stream at `sample_rate`.
    ///
    /// MPEG-2/2.5 Layer III tops out at 160 kbps.
    pub fn effective_kbps(&self, sample_rate: u32) -> u32 {
        match MpegVersion::for_sample_rate(sample_rate) {
            Some(MpegVersion::Mpeg1) | None => self.bitrate_kbps,
            Some(_) => self.bitrate_kbps.min(MPEG2_MAX_KBPS),
        }
    }
}

/// Check that an output stream with these parameters can be encoded
pub fn validate_output(sample_rate: u32, channels: usize) -> CodecResult<()> {
    if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
        return Err(CodecError::EncodeError(format!(
            "Unsupported sample rate: {} Hz",
            sample_rate
        )));
    }
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(CodecError::EncodeError(format!(
            "Unsupported channel count: {}",
            channels
        )));
    }
    Ok(())
}
