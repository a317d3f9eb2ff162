//! MPEG audio decoding
//!
//! Two passes:
//! 1. A structural pass over the frame headers (tag skip, sync, frame chain)
//!    that classifies unusable input without touching any payload.
//! 2. Full decode of the frame payloads with symphonia.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::buffer::AudioBuffer;
use crate::config::DecoderConfig;
use crate::error::{CodecError, CodecResult};
use crate::header::FrameHeader;
use crate::scan;

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the audio stream sits inside a buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamLayout {
    /// Byte offset of the first frame
    pub offset: usize,
    /// Header of the first frame
    pub first: FrameHeader,
    /// Complete frames found by the header walk
    pub frame_count: usize,
}

/// Classify a buffer by its frame headers alone.
///
/// - no frame header anywhere after the tag → `UnsupportedFormat`
/// - the first frame runs past the end of the buffer → `Truncated`
/// - a frame directly following its predecessor switches version, layer or
///   sample rate → `CorruptFrame`
///
/// A partial frame at the very end is dropped, not an error.
pub fn inspect(bytes: &[u8]) -> CodecResult<StreamLayout> {
    let (offset, first) = scan::first_frame(bytes).ok_or_else(|| {
        CodecError::UnsupportedFormat("no MPEG audio frame header found".to_string())
    })?;

    let needed = first.frame_len();
    let available = bytes.len() - offset;
    if needed > available {
        return Err(CodecError::Truncated {
            offset,
            needed,
            available,
        });
    }

    let mut frame_count = 0;
    for (index, frame) in scan::frames(bytes, offset).enumerate() {
        if frame.end() > bytes.len() {
            log::warn!(
                "Dropping partial frame at byte {} ({} of {} bytes present)",
                frame.offset,
                bytes.len() - frame.offset,
                frame.header.frame_len()
            );
            break;
        }
        if !first.same_stream(&frame.header) {
            if frame.contiguous {
                return Err(CodecError::CorruptFrame {
                    frame: index,
                    reason: format!(
                        "stream parameters changed mid-stream ({:?} {:?} {} Hz after {:?} {:?} {} Hz)",
                        frame.header.version,
                        frame.header.layer,
                        frame.header.sample_rate,
                        first.version,
                        first.layer,
                        first.sample_rate
                    ),
                });
            }
            // A resync landed on a false sync inside junk
            continue;
        }
        frame_count += 1;
    }

    Ok(StreamLayout {
        offset,
        first,
        frame_count,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECODER
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of decoding one track
#[derive(Debug, Clone)]
pub struct DecodedTrack {
    pub buffer: AudioBuffer,
    pub layout: StreamLayout,
    /// Packets decoded by the codec
    pub packets_decoded: usize,
    /// Corrupt packets replaced with silence
    pub concealed_frames: usize,
}

impl DecodedTrack {
    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.buffer.num_channels()
    }

    /// Samples per channel
    pub fn total_samples(&self) -> usize {
        self.buffer.frames()
    }
}

/// MPEG-1/2/2.5 Layer I/II/III decoder using symphonia
#[derive(Debug, Clone, Default)]
pub struct Mp3Decoder {
    config: DecoderConfig,
}

impl Mp3Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a complete in-memory file
    ///
    /// Only an incomplete first frame is `Truncated`. A partial frame at the
    /// end of an otherwise valid stream is dropped with a warning and the
    /// frames before it are returned.
    ///
    /// A frame whose payload the codec rejects fails the decode with
    /// `CorruptFrame` unless the config allows concealment, in which case
    /// the frame is replaced by silence of the same length.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<DecodedTrack> {
        let layout = inspect(bytes)?;

        // Start the codec on the frame the scanner found so both agree on
        // where the stream begins.
        let source = Cursor::new(bytes[layout.offset..].to_vec());
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(extension_for(&layout.first));

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| CodecError::UnsupportedFormat(format!("Failed to probe stream: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| CodecError::UnsupportedFormat("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params.sample_rate.unwrap_or(layout.first.sample_rate);
        let channels = codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or_else(|| layout.first.channels());

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| {
                CodecError::UnsupportedFormat(format!("Failed to create decoder: {}", e))
            })?;

        let mut output = AudioBuffer::new(channels, sample_rate);
        let mut sample_buf: Option<SampleBuffer<f32>> = None;
        let mut packet_index = 0usize;
        let mut packets_decoded = 0usize;
        let mut concealed_frames = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(CodecError::CorruptFrame {
                        frame: packet_index,
                        reason: format!("Packet read error: {}", e),
                    });
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let buf = sample_buf.get_or_insert_with(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
                    });
                    buf.copy_interleaved_ref(decoded);
                    append_interleaved(&mut output, buf.samples(), spec.channels.count());
                    packets_decoded += 1;
                }
                Err(e @ (SymphoniaError::DecodeError(_) | SymphoniaError::IoError(_))) => {
                    if !self.config.may_conceal(concealed_frames) {
                        return Err(CodecError::CorruptFrame {
                            frame: packet_index,
                            reason: e.to_string(),
                        });
                    }
                    let frames = if packet.dur > 0 {
                        packet.dur as usize
                    } else {
                        layout.first.samples_per_frame()
                    };
                    log::warn!(
                        "Concealing corrupt frame #{} with {} samples of silence: {}",
                        packet_index,
                        frames,
                        e
                    );
                    for ch in output.channels.iter_mut() {
                        ch.resize(ch.len() + frames, 0.0);
                    }
                    concealed_frames += 1;
                }
                Err(e) => {
                    return Err(CodecError::CorruptFrame {
                        frame: packet_index,
                        reason: e.to_string(),
                    });
                }
            }
            packet_index += 1;
        }

        log::debug!(
            "Decoded {} packets ({} concealed): {} samples/ch, {} Hz, {} ch",
            packets_decoded,
            concealed_frames,
            output.frames(),
            sample_rate,
            channels
        );

        Ok(DecodedTrack {
            buffer: output,
            layout,
            packets_decoded,
            concealed_frames,
        })
    }
}

/// File extension symphonia's probe associates with the layer
fn extension_for(header: &FrameHeader) -> &'static str {
    match header.layer {
        crate::header::Layer::Layer1 => "mp1",
        crate::header::Layer::Layer2 => "mp2",
        crate::header::Layer::Layer3 => "mp3",
    }
}

/// Append interleaved samples, mapping a differing packet channel count onto
/// the buffer's channels.
fn append_interleaved(output: &mut AudioBuffer, samples: &[f32], packet_channels: usize) {
    if packet_channels == 0 {
        return;
    }
    for frame in samples.chunks_exact(packet_channels) {
        for (ch, plane) in output.channels.iter_mut().enumerate() {
            plane.push(frame[ch.min(packet_channels - 1)]);
        }
    }
}
