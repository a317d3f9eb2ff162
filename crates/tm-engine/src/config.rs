//! Engine configuration

use serde::{Deserialize, Serialize};
use tm_codec::{DecoderConfig, Mp3Config};

use crate::error::{MergeError, MergeResult};

/// Merge engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Corrupt-frame handling
    pub decoder: DecoderConfig,

    /// Output encoding
    pub encoder: Mp3Config,

    /// Keep decoded samples per track between combines
    pub cache_decoded: bool,

    /// Decode tracks on the rayon pool
    pub parallel_decode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            encoder: Mp3Config::default(),
            cache_decoded: true,
            parallel_decode: true,
        }
    }
}

impl EngineConfig {
    /// Fast encode for recomputing on every slider move
    pub fn live_preview() -> Self {
        Self {
            encoder: Mp3Config::preview(),
            ..Default::default()
        }
    }

    /// Best output for a final export
    pub fn export() -> Self {
        Self {
            encoder: Mp3Config::high_quality(),
            ..Default::default()
        }
    }

    /// Set encoder configuration
    pub fn with_encoder(mut self, encoder: Mp3Config) -> Self {
        self.encoder = encoder;
        self
    }

    /// Set decoder configuration
    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    /// Enable/disable the decode cache
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_decoded = enabled;
        self
    }

    /// Enable/disable parallel decoding
    pub fn with_parallel_decode(mut self, enabled: bool) -> Self {
        self.parallel_decode = enabled;
        self
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> MergeResult<Self> {
        serde_json::from_str(json).map_err(|e| MergeError::InvalidConfig(e.to_string()))
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> MergeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MergeError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert!(cfg.cache_decoded);
        assert!(cfg.parallel_decode);
        assert_eq!(cfg.encoder.bitrate_kbps, 192);
        assert!(!cfg.decoder.conceal_corrupt_frames);
    }

    #[test]
    fn test_json_roundtrip_and_partial() {
        let cfg = EngineConfig::export().with_cache(false);
        let json = cfg.to_json().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), cfg);

        let partial = EngineConfig::from_json_str(r#"{"encoder": {"bitrate_kbps": 96}}"#).unwrap();
        assert_eq!(partial.encoder.bitrate_kbps, 96);
        assert_eq!(partial.encoder.quality, 5);
        assert!(partial.cache_decoded);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(MergeError::InvalidConfig(_))
        ));
    }
}
