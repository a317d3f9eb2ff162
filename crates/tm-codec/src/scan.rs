//! Frame scanner
//!
//! Byte-level helpers shared by the duration estimator and the decoder:
//! - ID3v2 tag skipping
//! - sync search for the next valid frame header
//! - iteration over a chain of consecutive frames

use serde::Serialize;

use crate::header::{FrameHeader, HEADER_LEN};

/// ID3v2 tag signature
pub const ID3V2_MAGIC: [u8; 3] = *b"ID3";

/// ID3v2 header (and footer) length
pub const ID3V2_HEADER_LEN: usize = 10;

/// Offset of the synchsafe size field inside the ID3v2 header
const ID3V2_SIZE_OFFSET: usize = 6;

/// Footer-present flag in the ID3v2 flags byte
const ID3V2_FOOTER_FLAG: u8 = 0x10;

/// Decode a 4-byte synchsafe (base-128, big-endian) integer
pub fn synchsafe_u32(bytes: [u8; 4]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| (acc << 7) | u32::from(b & 0x7F))
}

/// Offset of the first byte after a leading ID3v2 tag, or 0 if the buffer
/// does not start with one.
///
/// The result may point past the end of a truncated buffer; callers scanning
/// from it simply find nothing.
pub fn skip_tag(buf: &[u8]) -> usize {
    if buf.len() < ID3V2_HEADER_LEN || buf[..3] != ID3V2_MAGIC {
        return 0;
    }

    let size_bytes = [
        buf[ID3V2_SIZE_OFFSET],
        buf[ID3V2_SIZE_OFFSET + 1],
        buf[ID3V2_SIZE_OFFSET + 2],
        buf[ID3V2_SIZE_OFFSET + 3],
    ];
    let mut end = ID3V2_HEADER_LEN + synchsafe_u32(size_bytes) as usize;

    if buf[5] & ID3V2_FOOTER_FLAG != 0 {
        end += ID3V2_HEADER_LEN;
    }

    end
}

/// Offset of the first valid frame header at or after `start`
pub fn find_frame(buf: &[u8], start: usize) -> Option<usize> {
    if buf.len() < HEADER_LEN || start > buf.len() - HEADER_LEN {
        return None;
    }

    (start..=buf.len() - HEADER_LEN).find(|&pos| FrameHeader::parse(&buf[pos..]).is_some())
}

/// Locate and parse the first frame of the audio stream, skipping a leading
/// tag if present.
pub fn first_frame(buf: &[u8]) -> Option<(usize, FrameHeader)> {
    let pos = find_frame(buf, skip_tag(buf))?;
    FrameHeader::parse(&buf[pos..]).map(|h| (pos, h))
}

// ═══════════════════════════════════════════════════════════════════════════════
// FRAME ITERATION
// ═══════════════════════════════════════════════════════════════════════════════

/// One frame located in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef {
    pub offset: usize,
    pub header: FrameHeader,
    /// Found exactly where the previous frame ended (no resync needed)
    pub contiguous: bool,
}

impl FrameRef {
    /// Byte offset one past the end of the frame
    pub fn end(&self) -> usize {
        self.offset + self.header.frame_len()
    }
}

/// Iterator over the frames of a buffer.
///
/// Walks frame-to-frame using each header's declared length and falls back to
/// a sync search when the next header is missing. Stops at the end of the
/// buffer; the final frame may extend past it (check [`FrameRef::end`]).
pub struct Frames<'a> {
    buf: &'a [u8],
    next: Option<usize>,
    contiguous: bool,
}

/// Iterate frames starting at `start`
pub fn frames(buf: &[u8], start: usize) -> Frames<'_> {
    Frames {
        buf,
        next: find_frame(buf, start),
        contiguous: false,
    }
}

impl Iterator for Frames<'_> {
    type Item = FrameRef;

    fn next(&mut self) -> Option<FrameRef> {
        let offset = self.next.take()?;
        let header = FrameHeader::parse(&self.buf[offset..])?;
        let frame = FrameRef {
            offset,
            header,
            contiguous: self.contiguous,
        };

        let end = frame.end();
        if end + HEADER_LEN <= self.buf.len() && FrameHeader::parse(&self.buf[end..]).is_some() {
            self.next = Some(end);
            self.contiguous = true;
        } else if end < self.buf.len() {
            self.next = find_frame(self.buf, end);
            self.contiguous = false;
        }

        Some(frame)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STREAM SUMMARY
// ═══════════════════════════════════════════════════════════════════════════════

/// Full-walk statistics over every complete frame of a buffer.
///
/// Unlike the first-frame duration estimate this accounts for variable
/// bitrate, at the cost of touching every header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreamSummary {
    pub first_offset: usize,
    pub frame_count: usize,
    /// Samples per channel across all complete frames
    pub total_samples: u64,
    pub sample_rate: u32,
    pub channels: usize,
    pub min_bitrate_kbps: u32,
    pub max_bitrate_kbps: u32,
    /// Bytes covered by complete frames
    pub audio_bytes: u64,
}

impl StreamSummary {
    /// Walk the buffer; `None` if no complete frame exists
    pub fn scan(buf: &[u8]) -> Option<Self> {
        let mut summary: Option<StreamSummary> = None;

        for frame in frames(buf, skip_tag(buf)) {
            if frame.end() > buf.len() {
                break;
            }
            let h = frame.header;
            match summary.as_mut() {
                None => {
                    summary = Some(StreamSummary {
                        first_offset: frame.offset,
                        frame_count: 1,
                        total_samples: h.samples_per_frame() as u64,
                        sample_rate: h.sample_rate,
                        channels: h.channels(),
                        min_bitrate_kbps: h.bitrate_kbps,
                        max_bitrate_kbps: h.bitrate_kbps,
                        audio_bytes: h.frame_len() as u64,
                    });
                }
                Some(s) => {
                    if h.sample_rate != s.sample_rate {
                        continue;
                    }
                    s.frame_count += 1;
                    s.total_samples += h.samples_per_frame() as u64;
                    s.min_bitrate_kbps = s.min_bitrate_kbps.min(h.bitrate_kbps);
                    s.max_bitrate_kbps = s.max_bitrate_kbps.max(h.bitrate_kbps);
                    s.audio_bytes += h.frame_len() as u64;
                }
            }
        }

        summary
    }

    /// True when every frame shares one bitrate
    pub fn is_constant_bitrate(&self) -> bool {
        self.min_bitrate_kbps == self.max_bitrate_kbps
    }

    /// Exact playback duration in seconds
    pub fn duration(&self) -> f64 {
        self.total_samples as f64 / self.sample_rate as f64
    }

    /// Mean bitrate over the audio payload in kbps
    pub fn average_bitrate_kbps(&self) -> f64 {
        let secs = self.duration();
        if secs <= 0.0 {
            0.0
        } else {
            self.audio_bytes as f64 * 8.0 / secs / 1000.0
        }
    }
}
