//! Merge engine façade
//!
//! The engine is either Empty or Loaded with an immutable track set.
//! `ingest` replaces the whole set (or nothing, on failure), `combine` mixes
//! the current set with one gain per track and re-encodes it, `reset` drops
//! back to Empty.
//!
//! State lives behind a `RwLock` holding an `Arc` snapshot: a combine clones
//! the `Arc` under the read lock and works lock-free from there, so a
//! concurrent ingest or reset never tears a mix in progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rayon::prelude::*;
use tm_codec::{
    estimate_duration, scan, AudioBuffer, AudioEncoder, CodecResult, DecodedTrack,
    EstimatedDuration, LameMp3Encoder, Mp3Decoder,
};

use crate::cache::DecodeCache;
use crate::config::EngineConfig;
use crate::error::{IngestReport, MergeError, MergeResult, TrackFailure};
use crate::gain::GainVector;
use crate::mixer;
use crate::track::{RawTrack, TrackId, TrackMetadata, TrackSet, TrackSource, TrackSummary};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Encoded result of one mix
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedBuffer {
    /// Self-contained encoded stream
    pub bytes: Vec<u8>,
    /// Sample rate of the encoded stream
    pub sample_rate: u32,
    pub channels: usize,
    /// Mixed samples per channel before encoding
    pub frames: usize,
    mime_type: &'static str,
}

impl CombinedBuffer {
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Length of the mix in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }

    /// Header-based estimate, as a player would show it
    pub fn estimated_duration(&self) -> EstimatedDuration {
        estimate_duration(&self.bytes, self.bytes.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of a successful ingest
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// One entry per file, in batch order
    pub tracks: Vec<TrackSummary>,
    /// All tracks at unity gain
    pub preview: CombinedBuffer,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
enum EngineState {
    #[default]
    Empty,
    Loaded(Arc<TrackSet>),
}

/// Stateful merge engine
pub struct MergeEngine {
    config: EngineConfig,
    decoder: Mp3Decoder,
    encoder: Box<dyn AudioEncoder>,
    state: RwLock<EngineState>,
    /// Next track ID
    next_id: AtomicU64,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MergeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let encoder = Box::new(LameMp3Encoder::new(config.encoder));
        Self::with_encoder(config, encoder)
    }

    /// Use a custom encoder for the mixed output
    pub fn with_encoder(config: EngineConfig, encoder: Box<dyn AudioEncoder>) -> Self {
        Self {
            decoder: Mp3Decoder::new(config.decoder),
            encoder,
            config,
            state: RwLock::new(EngineState::Empty),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.read(), EngineState::Loaded(_))
    }

    /// Number of loaded tracks (0 when empty)
    pub fn track_count(&self) -> usize {
        match &*self.state.read() {
            EngineState::Empty => 0,
            EngineState::Loaded(set) => set.len(),
        }
    }

    /// Loaded tracks in ingestion order
    pub fn tracks(&self) -> Vec<TrackSummary> {
        match &*self.state.read() {
            EngineState::Empty => Vec::new(),
            EngineState::Loaded(set) => set.tracks().iter().map(RawTrack::summary).collect(),
        }
    }

    /// Metadata of loaded tracks in ingestion order
    pub fn metadata(&self) -> Vec<TrackMetadata> {
        match &*self.state.read() {
            EngineState::Empty => Vec::new(),
            EngineState::Loaded(set) => set.tracks().iter().map(|t| t.metadata.clone()).collect(),
        }
    }

    fn snapshot(&self) -> MergeResult<Arc<TrackSet>> {
        match &*self.state.read() {
            EngineState::Empty => Err(MergeError::NotLoaded),
            EngineState::Loaded(set) => Ok(Arc::clone(set)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ingest
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the track set with `sources`.
    ///
    /// All or nothing: if any file fails to decode, or the sample rates
    /// disagree, the previous state is kept and the error names every
    /// offending file. On success returns one summary per file plus a
    /// unity-gain preview mix.
    pub fn ingest(&self, sources: Vec<TrackSource>) -> MergeResult<IngestOutcome> {
        if sources.is_empty() {
            return Err(MergeError::EmptyBatch);
        }

        let start = Instant::now();
        let results = self.decode_batch(&sources);

        let mut decoded = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();
        for (index, (source, result)) in sources.iter().zip(results).enumerate() {
            match result {
                Ok(track) => decoded.push(track),
                Err(error) => {
                    log::warn!("Ingest: '{}' failed to decode: {}", source.name, error);
                    failures.push(TrackFailure {
                        index,
                        name: source.name.clone(),
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(MergeError::IngestFailed(IngestReport {
                batch_size: sources.len(),
                failures,
            }));
        }

        let sample_rate = decoded[0].sample_rate();
        for (index, track) in decoded.iter().enumerate().skip(1) {
            if track.sample_rate() != sample_rate {
                return Err(MergeError::SampleRateMismatch {
                    index,
                    expected: sample_rate,
                    actual: track.sample_rate(),
                });
            }
        }

        let concealed: Vec<usize> = decoded.iter().map(|t| t.concealed_frames).collect();
        let buffers: Vec<Arc<AudioBuffer>> = decoded
            .into_iter()
            .map(|track| Arc::new(track.buffer))
            .collect();
        let refs: Vec<&AudioBuffer> = buffers.iter().map(|b| b.as_ref()).collect();
        let preview = self.mix_and_encode(&refs, &GainVector::unity(refs.len()))?;

        let cache = DecodeCache::new(self.config.cache_decoded);
        let mut tracks = Vec::with_capacity(sources.len());
        for ((source, buffer), concealed) in sources.into_iter().zip(buffers).zip(concealed) {
            let id = TrackId(self.next_id.fetch_add(1, Ordering::Relaxed));
            let duration = estimate_duration(&source.bytes, source.bytes.len() as u64);
            if concealed > 0 {
                log::warn!(
                    "Ingest: '{}' had {} corrupt frames replaced with silence",
                    source.name,
                    concealed
                );
            }
            let metadata = TrackMetadata {
                duration,
                sample_rate: buffer.sample_rate,
                channels: buffer.num_channels(),
                total_samples: buffer.frames(),
            };
            cache.insert(id, buffer);
            tracks.push(RawTrack {
                id,
                name: source.name,
                bytes: Arc::from(source.bytes),
                metadata,
            });
        }

        let summaries: Vec<TrackSummary> = tracks.iter().map(RawTrack::summary).collect();
        let set = Arc::new(TrackSet::new(tracks, sample_rate, cache));

        log::info!(
            "Ingested {} tracks at {} Hz in {:.1}ms ({} buffers cached, {} samples)",
            set.len(),
            set.sample_rate(),
            elapsed_ms(start.elapsed()),
            set.cache_len(),
            set.cache_samples()
        );

        *self.state.write() = EngineState::Loaded(set);

        Ok(IngestOutcome {
            tracks: summaries,
            preview,
        })
    }

    fn decode_batch(&self, sources: &[TrackSource]) -> Vec<CodecResult<DecodedTrack>> {
        if self.config.parallel_decode {
            sources
                .par_iter()
                .map(|s| self.decoder.decode(&s.bytes))
                .collect()
        } else {
            sources.iter().map(|s| self.decoder.decode(&s.bytes)).collect()
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Combine
    // ─────────────────────────────────────────────────────────────────────────

    /// Mix the loaded tracks with one gain (0-100) per track and encode.
    ///
    /// Read-only with respect to engine state; identical gains over the same
    /// track set give byte-identical output.
    pub fn combine(&self, gains: &[u8]) -> MergeResult<CombinedBuffer> {
        let set = self.snapshot()?;
        let gains = GainVector::for_tracks(gains.to_vec(), set.len())?;

        let start = Instant::now();
        let buffers = self.decoded_buffers(&set)?;
        let refs: Vec<&AudioBuffer> = buffers.iter().map(|b| b.as_ref()).collect();
        let combined = self.mix_and_encode(&refs, &gains)?;

        log::debug!(
            "Combined {} tracks with gains {:?} in {:.1}ms -> {} bytes",
            set.len(),
            gains.percents(),
            elapsed_ms(start.elapsed()),
            combined.len()
        );

        Ok(combined)
    }

    fn decoded_buffers(&self, set: &TrackSet) -> MergeResult<Vec<Arc<AudioBuffer>>> {
        let buffers: CodecResult<Vec<Arc<AudioBuffer>>> = if self.config.parallel_decode {
            set.tracks()
                .par_iter()
                .map(|track| set.decoded(track, &self.decoder))
                .collect()
        } else {
            set.tracks()
                .iter()
                .map(|track| set.decoded(track, &self.decoder))
                .collect()
        };
        buffers.map_err(MergeError::from)
    }

    fn mix_and_encode(
        &self,
        tracks: &[&AudioBuffer],
        gains: &GainVector,
    ) -> MergeResult<CombinedBuffer> {
        let mixed = mixer::mix(tracks, gains)?;
        let bytes = self.encoder.encode(&mixed)?;

        // The encoder may pick its own output rate
        let sample_rate = scan::first_frame(&bytes)
            .map(|(_, header)| header.sample_rate)
            .unwrap_or(mixed.sample_rate);

        Ok(CombinedBuffer {
            bytes,
            sample_rate,
            channels: mixed.num_channels(),
            frames: mixed.frames(),
            mime_type: self.encoder.mime_type(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reset
    // ─────────────────────────────────────────────────────────────────────────

    /// Drop all tracks and cached samples
    pub fn reset(&self) {
        let previous = std::mem::take(&mut *self.state.write());
        if let EngineState::Loaded(set) = previous {
            log::info!("Reset: released {} tracks", set.len());
        }
    }
}

fn elapsed_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_codec::Mp3Config;

    fn tone_mp3(freq: f32, seconds: f32, channels: usize, sample_rate: u32) -> Vec<u8> {
        let frames = (seconds * sample_rate as f32) as usize;
        let plane: Vec<f32> = (0..frames)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        let buffer = AudioBuffer {
            channels: vec![plane; channels],
            sample_rate,
        };
        LameMp3Encoder::new(Mp3Config::default())
            .encode(&buffer)
            .unwrap()
    }

    #[test]
    fn test_ids_are_fresh_across_ingests() {
        let engine = MergeEngine::default();
        let bytes = tone_mp3(440.0, 0.2, 2, 44100);

        let first = engine
            .ingest(vec![
                TrackSource::new("a", bytes.clone()),
                TrackSource::new("b", bytes.clone()),
            ])
            .unwrap();
        let second = engine.ingest(vec![TrackSource::new("c", bytes)]).unwrap();

        assert_eq!(first.tracks[0].id, TrackId(1));
        assert_eq!(first.tracks[1].id, TrackId(2));
        assert_eq!(second.tracks[0].id, TrackId(3));
        assert_eq!(engine.track_count(), 1);
    }

    #[test]
    fn test_ingest_fills_cache() {
        let engine = MergeEngine::default();
        let bytes = tone_mp3(440.0, 0.2, 2, 44100);
        engine
            .ingest(vec![
                TrackSource::new("a", bytes.clone()),
                TrackSource::new("b", bytes),
            ])
            .unwrap();

        let set = engine.snapshot().unwrap();
        assert_eq!(set.cache().len(), 2);
    }

    #[test]
    fn test_cache_disabled_decodes_each_combine() {
        let engine = MergeEngine::new(EngineConfig::default().with_cache(false));
        let bytes = tone_mp3(440.0, 0.2, 1, 44100);
        engine.ingest(vec![TrackSource::new("a", bytes)]).unwrap();

        let set = engine.snapshot().unwrap();
        assert_eq!(set.cache().len(), 0);
        assert!(engine.combine(&[80]).is_ok());
        assert_eq!(set.cache().len(), 0);
    }

    #[test]
    fn test_combined_buffer_metadata() {
        let engine = MergeEngine::default();
        let bytes = tone_mp3(440.0, 0.5, 1, 44100);
        let outcome = engine.ingest(vec![TrackSource::new("a", bytes)]).unwrap();

        let preview = outcome.preview;
        assert_eq!(preview.mime_type(), "audio/mpeg");
        assert_eq!(preview.sample_rate, 44100);
        assert_eq!(preview.channels, 1);
        assert!(preview.duration() >= 0.5);
        assert!(!preview.is_empty());
    }

    #[test]
    fn test_combine_reports_length_before_range() {
        let engine = MergeEngine::default();
        let bytes = tone_mp3(440.0, 0.2, 2, 44100);
        engine
            .ingest(vec![
                TrackSource::new("a", bytes.clone()),
                TrackSource::new("b", bytes),
            ])
            .unwrap();

        assert_eq!(
            engine.combine(&[150]).unwrap_err(),
            MergeError::GainVectorLengthMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(
            engine.combine(&[100, 150]).unwrap_err(),
            MergeError::GainOutOfRange {
                index: 1,
                value: 150
            }
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        let engine = MergeEngine::default();
        engine.reset();
        assert!(!engine.is_loaded());

        let bytes = tone_mp3(440.0, 0.2, 2, 44100);
        engine.ingest(vec![TrackSource::new("a", bytes)]).unwrap();
        assert!(engine.is_loaded());

        engine.reset();
        engine.reset();
        assert!(!engine.is_loaded());
        assert!(engine.tracks().is_empty());
        assert!(engine.metadata().is_empty());
    }
}
