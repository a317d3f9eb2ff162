//! Tracks held by the engine

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tm_codec::{AudioBuffer, CodecResult, EstimatedDuration, Mp3Decoder};

use crate::cache::DecodeCache;

/// Unique track identifier, allocated per engine in ingestion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// One file handed to the engine
#[derive(Debug, Clone)]
pub struct TrackSource {
    /// Display name, usually the file name
    pub name: String,
    pub bytes: Vec<u8>,
}

impl TrackSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Facts learned about a track at ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Header-based estimate, not the decoded length
    pub duration: EstimatedDuration,
    pub sample_rate: u32,
    pub channels: usize,
    /// Decoded samples per channel
    pub total_samples: usize,
}

/// An ingested track: the original bytes plus metadata
#[derive(Debug, Clone)]
pub struct RawTrack {
    pub id: TrackId,
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub metadata: TrackMetadata,
}

impl RawTrack {
    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id,
            display_name: self.name.clone(),
            duration: self.metadata.duration,
        }
    }
}

/// What a UI shows per track after ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub display_name: String,
    pub duration: EstimatedDuration,
}

/// Immutable set of tracks from one successful ingest.
///
/// Shared by `Arc` between the engine state and in-flight combines; only
/// the decode cache behind it changes.
#[derive(Debug)]
pub(crate) struct TrackSet {
    tracks: Vec<RawTrack>,
    sample_rate: u32,
    cache: DecodeCache,
}

impl TrackSet {
    pub(crate) fn new(tracks: Vec<RawTrack>, sample_rate: u32, cache: DecodeCache) -> Self {
        Self {
            tracks,
            sample_rate,
            cache,
        }
    }

    pub(crate) fn tracks(&self) -> &[RawTrack] {
        &self.tracks
    }

    pub(crate) fn len(&self) -> usize {
        self.tracks.len()
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &DecodeCache {
        &self.cache
    }

    pub(crate) fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn cache_samples(&self) -> usize {
        self.cache.sample_count()
    }

    /// Decoded samples for `track`, from cache when present
    pub(crate) fn decoded(
        &self,
        track: &RawTrack,
        decoder: &Mp3Decoder,
    ) -> CodecResult<Arc<AudioBuffer>> {
        if let Some(buffer) = self.cache.get(track.id) {
            return Ok(buffer);
        }

        let decoded = decoder.decode(&track.bytes)?;
        let buffer = Arc::new(decoded.buffer);
        self.cache.insert(track.id, Arc::clone(&buffer));
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_display() {
        assert_eq!(TrackId(7).to_string(), "track-7");
        assert!(TrackId(1) < TrackId(2));
    }

    #[test]
    fn test_summary_serializes_for_ui() {
        let track = RawTrack {
            id: TrackId(3),
            name: "drums.mp3".to_string(),
            bytes: Arc::from(Vec::new()),
            metadata: TrackMetadata {
                duration: EstimatedDuration::from_seconds(61.5),
                sample_rate: 44100,
                channels: 2,
                total_samples: 2_712_150,
            },
        };

        let json = serde_json::to_value(track.summary()).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["display_name"], "drums.mp3");
        assert_eq!(json["duration"]["seconds"], 61.5);
    }
}
