//! Decoder configuration

use serde::{Deserialize, Serialize};

/// How the decoder treats frames whose payload fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Replace corrupt frames with silence instead of failing
    pub conceal_corrupt_frames: bool,

    /// Concealed frames tolerated per track before giving up
    pub max_concealed_frames: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            conceal_corrupt_frames: false,
            max_concealed_frames: 0,
        }
    }
}

impl DecoderConfig {
    /// Fail on the first corrupt frame
    pub fn strict() -> Self {
        Self::default()
    }

    /// Conceal up to `max_frames` corrupt frames per track
    pub fn tolerant(max_frames: usize) -> Self {
        Self {
            conceal_corrupt_frames: true,
            max_concealed_frames: max_frames,
        }
    }

    /// Whether one more concealed frame is allowed after `already` of them
    pub(crate) fn may_conceal(&self, already: usize) -> bool {
        self.conceal_corrupt_frames && already < self.max_concealed_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_never_conceals() {
        assert!(!DecoderConfig::strict().may_conceal(0));
    }

    #[test]
    fn test_tolerant_limit() {
        let cfg = DecoderConfig::tolerant(2);
        assert!(cfg.may_conceal(0));
        assert!(cfg.may_conceal(1));
        assert!(!cfg.may_conceal(2));
    }

    #[test]
    fn test_json_defaults_missing_fields() {
        let cfg: DecoderConfig = serde_json::from_str(r#"{"conceal_corrupt_frames": true}"#).unwrap();
        assert!(cfg.conceal_corrupt_frames);
        assert_eq!(cfg.max_concealed_frames, 0);
    }
}
