//! Planar PCM buffer shared by decoder, mixer and encoder

/// Decoded (or mixed) audio, one `Vec` per channel, samples in `[-1.0, 1.0]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioBuffer {
    /// Per-channel samples; every channel has the same length
    pub channels: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create an empty buffer
    pub fn new(num_channels: usize, sample_rate: u32) -> Self {
        Self {
            channels: vec![Vec::new(); num_channels],
            sample_rate,
        }
    }

    /// Create a silent buffer of `frames` samples per channel
    pub fn silence(num_channels: usize, sample_rate: u32, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; num_channels],
            sample_rate,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}
