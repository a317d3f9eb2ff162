//! MPEG audio frame header
//!
//! Every MPEG-1/2/2.5 audio frame starts with a 4-byte header:
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! A = sync (11 bits)     B = version      C = layer       D = protection
//! E = bitrate index      F = sample rate  G = padding     H = private
//! I = channel mode       J = mode ext     K = copyright   L = original
//! M = emphasis
//! ```

use serde::{Deserialize, Serialize};

/// Size of a frame header in bytes
pub const HEADER_LEN: usize = 4;

// ═══════════════════════════════════════════════════════════════════════════════
// TABLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Bitrates in kbps, indexed by `[row][bitrate_index]`. Index 0 (free format)
/// and 15 (bad) are never looked up.
const BITRATES: [[u32; 16]; 5] = [
    // MPEG-1 Layer I
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
    // MPEG-1 Layer II
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
    // MPEG-1 Layer III
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
    // MPEG-2/2.5 Layer I
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
    // MPEG-2/2.5 Layer II & III
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
];

const SAMPLE_RATES_MPEG1: [u32; 3] = [44100, 48000, 32000];
const SAMPLE_RATES_MPEG2: [u32; 3] = [22050, 24000, 16000];
const SAMPLE_RATES_MPEG25: [u32; 3] = [11025, 12000, 8000];

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// MPEG audio version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

impl MpegVersion {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b11 => Some(Self::Mpeg1),
            0b10 => Some(Self::Mpeg2),
            0b00 => Some(Self::Mpeg25),
            _ => None,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Mpeg1 => 0b11,
            Self::Mpeg2 => 0b10,
            Self::Mpeg25 => 0b00,
        }
    }

    fn sample_rates(self) -> &'static [u32; 3] {
        match self {
            Self::Mpeg1 => &SAMPLE_RATES_MPEG1,
            Self::Mpeg2 => &SAMPLE_RATES_MPEG2,
            Self::Mpeg25 => &SAMPLE_RATES_MPEG25,
        }
    }

    /// Version able to carry the given sample rate, if any
    pub fn for_sample_rate(sample_rate: u32) -> Option<Self> {
        [Self::Mpeg1, Self::Mpeg2, Self::Mpeg25]
            .into_iter()
            .find(|v| v.sample_rates().contains(&sample_rate))
    }
}

/// MPEG audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

impl Layer {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b11 => Some(Self::Layer1),
            0b10 => Some(Self::Layer2),
            0b01 => Some(Self::Layer3),
            _ => None,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Layer1 => 0b11,
            Self::Layer2 => 0b10,
            Self::Layer3 => 0b01,
        }
    }
}

/// Channel mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

impl ChannelMode {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0b00 => Self::Stereo,
            0b01 => Self::JointStereo,
            0b10 => Self::DualChannel,
            _ => Self::Mono,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Stereo => 0b00,
            Self::JointStereo => 0b01,
            Self::DualChannel => 0b10,
            Self::Mono => 0b11,
        }
    }

    pub fn channels(self) -> usize {
        if self == Self::Mono {
            1
        } else {
            2
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FRAME HEADER
// ═══════════════════════════════════════════════════════════════════════════════

/// Parsed MPEG audio frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    /// CRC follows the header
    pub protected: bool,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
}

impl FrameHeader {
    /// Parse the header at the start of `bytes`.
    ///
    /// Returns `None` unless the sync pattern matches and every field holds a
    /// legal value (reserved version/layer/sample rate/emphasis, free-format
    /// and bad bitrate indices are all rejected).
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let (b0, b1, b2, b3) = (bytes[0], bytes[1], bytes[2], bytes[3]);

        if b0 != 0xFF || b1 & 0xE0 != 0xE0 {
            return None;
        }

        let version = MpegVersion::from_bits((b1 >> 3) & 0b11)?;
        let layer = Layer::from_bits((b1 >> 1) & 0b11)?;
        let protected = b1 & 0x01 == 0;

        let bitrate_index = (b2 >> 4) as usize;
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let sr_index = ((b2 >> 2) & 0b11) as usize;
        if sr_index == 3 {
            return None;
        }
        if b3 & 0b11 == 0b10 {
            return None;
        }

        Some(Self {
            version,
            layer,
            protected,
            bitrate_kbps: BITRATES[Self::table_row(version, layer)][bitrate_index],
            sample_rate: version.sample_rates()[sr_index],
            padding: (b2 >> 1) & 0x01 == 1,
            channel_mode: ChannelMode::from_bits(b3 >> 6),
        })
    }

    fn table_row(version: MpegVersion, layer: Layer) -> usize {
        match (version, layer) {
            (MpegVersion::Mpeg1, Layer::Layer1) => 0,
            (MpegVersion::Mpeg1, Layer::Layer2) => 1,
            (MpegVersion::Mpeg1, Layer::Layer3) => 2,
            (_, Layer::Layer1) => 3,
            (_, _) => 4,
        }
    }

    /// Serialize back to the 4 header bytes.
    ///
    /// Returns `None` if the bitrate or sample rate is not representable for
    /// this version/layer. Copyright, original, private and emphasis bits are
    /// written as zero.
    pub fn to_bytes(&self) -> Option<[u8; HEADER_LEN]> {
        let row = &BITRATES[Self::table_row(self.version, self.layer)];
        let bitrate_index = (1..15).find(|&i| row[i] == self.bitrate_kbps)? as u8;
        let sr_index = self
            .version
            .sample_rates()
            .iter()
            .position(|&sr| sr == self.sample_rate)? as u8;

        let b1 = 0xE0
            | (self.version.bits() << 3)
            | (self.layer.bits() << 1)
            | u8::from(!self.protected);
        let b2 = (bitrate_index << 4) | (sr_index << 2) | (u8::from(self.padding) << 1);
        let b3 = self.channel_mode.bits() << 6;

        Some([0xFF, b1, b2, b3])
    }

    /// Bitrate in bits per second
    pub fn bitrate_bps(&self) -> u32 {
        self.bitrate_kbps * 1000
    }

    /// Number of audio channels carried by the frame
    pub fn channels(&self) -> usize {
        self.channel_mode.channels()
    }

    /// PCM samples (per channel) decoded from one frame
    pub fn samples_per_frame(&self) -> usize {
        match (self.layer, self.version) {
            (Layer::Layer1, _) => 384,
            (Layer::Layer2, _) => 1152,
            (Layer::Layer3, MpegVersion::Mpeg1) => 1152,
            (Layer::Layer3, _) => 576,
        }
    }

    /// Total frame length in bytes, header included
    pub fn frame_len(&self) -> usize {
        let br = self.bitrate_bps() as usize;
        let sr = self.sample_rate as usize;
        let pad = usize::from(self.padding);

        match (self.layer, self.version) {
            (Layer::Layer1, _) => (12 * br / sr + pad) * 4,
            (Layer::Layer3, MpegVersion::Mpeg2 | MpegVersion::Mpeg25) => 72 * br / sr + pad,
            _ => 144 * br / sr + pad,
        }
    }

    /// Playback time of one frame in seconds
    pub fn duration(&self) -> f64 {
        self.samples_per_frame() as f64 / self.sample_rate as f64
    }

    /// True if `other` belongs to the same elementary stream
    pub fn same_stream(&self, other: &FrameHeader) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mpeg1_layer3() {
        // 128 kbps, 44.1 kHz, no padding, joint stereo
        let h = FrameHeader::parse(&[0xFF, 0xFB, 0x90, 0x64]).unwrap();
        assert_eq!(h.version, MpegVersion::Mpeg1);
        assert_eq!(h.layer, Layer::Layer3);
        assert!(!h.protected);
        assert_eq!(h.bitrate_kbps, 128);
        assert_eq!(h.sample_rate, 44100);
        assert!(!h.padding);
        assert_eq!(h.channel_mode, ChannelMode::JointStereo);
        assert_eq!(h.frame_len(), 417);
        assert_eq!(h.samples_per_frame(), 1152);
    }

    #[test]
    fn test_padding_adds_one_byte() {
        let h = FrameHeader::parse(&[0xFF, 0xFB, 0x92, 0x64]).unwrap();
        assert!(h.padding);
        assert_eq!(h.frame_len(), 418);
    }

    #[test]
    fn test_mpeg2_layer3_mono() {
        let h = FrameHeader {
            version: MpegVersion::Mpeg2,
            layer: Layer::Layer3,
            protected: false,
            bitrate_kbps: 64,
            sample_rate: 22050,
            padding: false,
            channel_mode: ChannelMode::Mono,
        };
        let parsed = FrameHeader::parse(&h.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, h);
        assert_eq!(parsed.channels(), 1);
        assert_eq!(parsed.samples_per_frame(), 576);
        assert_eq!(parsed.frame_len(), 72 * 64_000 / 22050);
    }

    #[test]
    fn test_layer1_frame_len() {
        let h = FrameHeader {
            version: MpegVersion::Mpeg1,
            layer: Layer::Layer1,
            protected: true,
            bitrate_kbps: 384,
            sample_rate: 48000,
            padding: false,
            channel_mode: ChannelMode::Stereo,
        };
        assert_eq!(h.frame_len(), 384);
        assert_eq!(h.samples_per_frame(), 384);
    }

    #[test]
    fn test_rejects_reserved_fields() {
        // Bad sync
        assert!(FrameHeader::parse(&[0xFF, 0x7B, 0x90, 0x64]).is_none());
        // Reserved version (01)
        assert!(FrameHeader::parse(&[0xFF, 0xEB, 0x90, 0x64]).is_none());
        // Reserved layer (00)
        assert!(FrameHeader::parse(&[0xFF, 0xF9, 0x90, 0x64]).is_none());
        // Free-format bitrate
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0x00, 0x64]).is_none());
        // Bad bitrate
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0xF0, 0x64]).is_none());
        // Reserved sample rate
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0x9C, 0x64]).is_none());
        // Reserved emphasis
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0x90, 0x66]).is_none());
        // Too short
        assert!(FrameHeader::parse(&[0xFF, 0xFB, 0x90]).is_none());
    }

    #[test]
    fn test_to_bytes_rejects_unrepresentable_bitrate() {
        let h = FrameHeader {
            version: MpegVersion::Mpeg2,
            layer: Layer::Layer3,
            protected: false,
            bitrate_kbps: 320,
            sample_rate: 22050,
            padding: false,
            channel_mode: ChannelMode::Stereo,
        };
        assert!(h.to_bytes().is_none());
    }

    #[test]
    fn test_version_for_sample_rate() {
        assert_eq!(MpegVersion::for_sample_rate(48000), Some(MpegVersion::Mpeg1));
        assert_eq!(MpegVersion::for_sample_rate(16000), Some(MpegVersion::Mpeg2));
        assert_eq!(MpegVersion::for_sample_rate(8000), Some(MpegVersion::Mpeg25));
        assert_eq!(MpegVersion::for_sample_rate(96000), None);
    }
}
