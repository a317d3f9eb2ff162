//! tm-codec - MPEG audio format layer
//!
//! In-memory codec primitives for MPEG-1/2/2.5 Layer I/II/III streams:
//! - Frame scanner (sync search, ID3v2 tag skip, frame chain walk)
//! - Decoder (symphonia) with structural validation
//! - Encoder (native LAME), constant bitrate, deterministic
//! - Header-based duration estimator
//!
//! ## Data flow
//!
//! ```text
//!   raw bytes ──► scan ──► duration (side path, headers only)
//!       │
//!       └──────► Mp3Decoder ──► AudioBuffer ──► (mixer) ──► LameMp3Encoder ──► bytes
//! ```

mod buffer;
mod config;
mod decoder;
mod duration;
mod encoder;
mod error;
mod formats;
mod header;
pub mod scan;

pub use buffer::*;
pub use config::*;
pub use decoder::*;
pub use duration::*;
pub use encoder::*;
pub use error::*;
pub use formats::*;
pub use header::*;
pub use scan::StreamSummary;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
