//! Audio encoding module
//!
//! MP3 via mp3lame-encoder (native LAME). LAME emits a plain sequence of
//! frames, each with its own header, so the output plays and seeks without
//! any container or tag.

use crate::buffer::AudioBuffer;
use crate::error::{CodecError, CodecResult};
use crate::formats::{validate_output, Mp3Config};

// ═══════════════════════════════════════════════════════════════════════════════
// ENCODER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Audio encoder trait
pub trait AudioEncoder: Send + Sync {
    /// Encode audio buffer to bytes
    fn encode(&self, buffer: &AudioBuffer) -> CodecResult<Vec<u8>>;

    /// MIME type of the encoded bytes
    fn mime_type(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// MP3 ENCODER (Native LAME)
// ═══════════════════════════════════════════════════════════════════════════════

/// Native MP3 encoder using LAME via mp3lame-encoder crate.
///
/// Constant bitrate only. Identical input always yields identical bytes.
#[derive(Debug, Clone, Default)]
pub struct LameMp3Encoder {
    config: Mp3Config,
}

impl LameMp3Encoder {
    pub fn new(config: Mp3Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Mp3Config {
        &self.config
    }

    /// Snap a kbps value down to a bitrate LAME accepts
    fn lame_bitrate(kbps: u32) -> mp3lame_encoder::Bitrate {
        match kbps {
            0..=39 => mp3lame_encoder::Bitrate::Kbps32,
            40..=47 => mp3lame_encoder::Bitrate::Kbps40,
            48..=63 => mp3lame_encoder::Bitrate::Kbps48,
            64..=79 => mp3lame_encoder::Bitrate::Kbps64,
            80..=95 => mp3lame_encoder::Bitrate::Kbps80,
            96..=111 => mp3lame_encoder::Bitrate::Kbps96,
            112..=127 => mp3lame_encoder::Bitrate::Kbps112,
            128..=159 => mp3lame_encoder::Bitrate::Kbps128,
            160..=191 => mp3lame_encoder::Bitrate::Kbps160,
            192..=223 => mp3lame_encoder::Bitrate::Kbps192,
            224..=255 => mp3lame_encoder::Bitrate::Kbps224,
            256..=319 => mp3lame_encoder::Bitrate::Kbps256,
            _ => mp3lame_encoder::Bitrate::Kbps320,
        }
    }

    /// LAME algorithm quality: 0 = best, 9 = worst
    fn lame_quality(quality: u8) -> mp3lame_encoder::Quality {
        match quality {
            0 => mp3lame_encoder::Quality::Best,
            1 => mp3lame_encoder::Quality::SecondBest,
            2 => mp3lame_encoder::Quality::NearBest,
            3 => mp3lame_encoder::Quality::VeryNice,
            4 => mp3lame_encoder::Quality::Nice,
            5 => mp3lame_encoder::Quality::Good,
            6 => mp3lame_encoder::Quality::Decent,
            7 => mp3lame_encoder::Quality::Ok,
            8 => mp3lame_encoder::Quality::SecondWorst,
            _ => mp3lame_encoder::Quality::Worst,
        }
    }
}

/// Full-scale conversion; input is expected to be clipped already
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

impl AudioEncoder for LameMp3Encoder {
    fn encode(&self, buffer: &AudioBuffer) -> CodecResult<Vec<u8>> {
        use mp3lame_encoder::{Builder, DualPcm, FlushNoGap};

        let channels = buffer.num_channels();
        validate_output(buffer.sample_rate, channels)?;

        let num_frames = buffer.frames();
        if buffer.channels.iter().any(|ch| ch.len() != num_frames) {
            return Err(CodecError::EncodeError(
                "Channel lengths differ".to_string(),
            ));
        }

        let mut builder = Builder::new()
            .ok_or_else(|| CodecError::EncodeError("LAME encoder init failed".to_string()))?;

        builder.set_num_channels(channels as u8).map_err(|e| {
            CodecError::EncodeError(format!("LAME set channels failed: {:?}", e))
        })?;

        builder.set_sample_rate(buffer.sample_rate).map_err(|e| {
            CodecError::EncodeError(format!("LAME set sample rate failed: {:?}", e))
        })?;

        let kbps = self.config.effective_kbps(buffer.sample_rate);
        builder.set_brate(Self::lame_bitrate(kbps)).map_err(|e| {
            CodecError::EncodeError(format!("LAME set bitrate failed: {:?}", e))
        })?;

        builder
            .set_quality(Self::lame_quality(self.config.quality))
            .map_err(|e| CodecError::EncodeError(format!("LAME set quality failed: {:?}", e)))?;

        let mut encoder = builder
            .build()
            .map_err(|e| CodecError::EncodeError(format!("LAME build failed: {:?}", e)))?;

        // LAME reads only the left plane when configured for mono
        let left: Vec<i16> = buffer.channels[0].iter().copied().map(to_i16).collect();
        let right: Vec<i16> = if channels == 2 {
            buffer.channels[1].iter().copied().map(to_i16).collect()
        } else {
            left.clone()
        };

        let mut mp3_output: Vec<u8> =
            Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(num_frames));

        let input = DualPcm {
            left: &left,
            right: &right,
        };

        let encoded_size = encoder
            .encode(input, mp3_output.spare_capacity_mut())
            .map_err(|e| CodecError::EncodeError(format!("LAME encode failed: {:?}", e)))?;

        // SAFETY: encoder wrote encoded_size bytes into spare capacity
        unsafe {
            mp3_output.set_len(encoded_size);
        }

        mp3_output.reserve(7200);
        let flush_size = encoder
            .flush::<FlushNoGap>(mp3_output.spare_capacity_mut())
            .map_err(|e| CodecError::EncodeError(format!("LAME flush failed: {:?}", e)))?;

        // SAFETY: encoder wrote flush_size bytes into spare capacity
        unsafe {
            mp3_output.set_len(mp3_output.len() + flush_size);
        }

        log::debug!(
            "Encoded {} samples/ch at {} Hz, {} ch, {} kbps -> {} bytes",
            num_frames,
            buffer.sample_rate,
            channels,
            kbps,
            mp3_output.len()
        );

        Ok(mp3_output)
    }

    fn mime_type(&self) -> &'static str {
        "audio/mpeg"
    }
}
