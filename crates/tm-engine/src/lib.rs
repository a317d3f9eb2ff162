//! tm-engine - Stateful audio merge engine
//!
//! Holds a set of compressed tracks and re-mixes them on demand:
//! - All-or-nothing ingest with per-file failure reports
//! - Per-track linear gain (0-100%), sum, clip, re-encode
//! - Decoded-sample cache per track set
//! - Snapshot state: combines run concurrently with each other and with
//!   ingest/reset
//!
//! ## Example
//!
//! ```no_run
//! use tm_engine::{MergeEngine, TrackSource};
//!
//! let engine = MergeEngine::default();
//! let outcome = engine.ingest(vec![
//!     TrackSource::new("vocals.mp3", std::fs::read("vocals.mp3")?),
//!     TrackSource::new("drums.mp3", std::fs::read("drums.mp3")?),
//! ])?;
//! for track in &outcome.tracks {
//!     println!("{} {}", track.display_name, track.duration);
//! }
//!
//! let mix = engine.combine(&[80, 50])?;
//! std::fs::write("mix.mp3", &mix.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cache;
mod config;
mod engine;
mod error;
mod gain;
pub mod mixer;
mod track;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use gain::*;
pub use track::{RawTrack, TrackId, TrackMetadata, TrackSource, TrackSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
