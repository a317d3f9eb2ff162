//! Gain-weighted sum of decoded tracks
//!
//! Tracks are aligned at sample 0. The mix is as long as the longest track;
//! shorter tracks contribute silence past their end. Mono tracks feed every
//! output channel. The sum is clipped to `[-1.0, 1.0]` as the last step.

use tm_codec::AudioBuffer;

use crate::error::{MergeError, MergeResult};
use crate::gain::GainVector;

/// Check sample rates and gain count, returning the shared sample rate
fn check_inputs(tracks: &[&AudioBuffer], gains: &GainVector) -> MergeResult<u32> {
    gains.check_len(tracks.len())?;
    let first = tracks.first().ok_or(MergeError::NotLoaded)?;

    for (index, track) in tracks.iter().enumerate().skip(1) {
        if track.sample_rate != first.sample_rate {
            return Err(MergeError::SampleRateMismatch {
                index,
                expected: first.sample_rate,
                actual: track.sample_rate,
            });
        }
    }
    Ok(first.sample_rate)
}

/// Weighted sum without clipping.
///
/// Linear in the gains: scaling every gain by `k` scales every output sample
/// by `k`.
pub fn sum_tracks(tracks: &[&AudioBuffer], gains: &GainVector) -> MergeResult<AudioBuffer> {
    let sample_rate = check_inputs(tracks, gains)?;

    let out_channels = tracks.iter().map(|t| t.num_channels()).max().unwrap_or(0);
    let out_frames = tracks.iter().map(|t| t.frames()).max().unwrap_or(0);
    let mut out = AudioBuffer::silence(out_channels, sample_rate, out_frames);

    for (index, track) in tracks.iter().enumerate() {
        let gain = gains.factor(index);
        if gain == 0.0 || track.num_channels() == 0 {
            continue;
        }

        for (ch, out_plane) in out.channels.iter_mut().enumerate() {
            // Mono (or fewer channels than the mix) reuses the last plane
            let src = &track.channels[ch.min(track.num_channels() - 1)];
            for (dst, &s) in out_plane.iter_mut().zip(src.iter()) {
                *dst += s * gain;
            }
        }
    }

    Ok(out)
}

/// Clip every sample to `[-1.0, 1.0]` in place; returns how many were clipped
pub fn clip(buffer: &mut AudioBuffer) -> usize {
    let mut clipped = 0;
    for plane in &mut buffer.channels {
        for s in plane.iter_mut() {
            if s.is_nan() {
                *s = 0.0;
                clipped += 1;
            } else if *s > 1.0 || *s < -1.0 {
                *s = s.clamp(-1.0, 1.0);
                clipped += 1;
            }
        }
    }
    clipped
}

/// Sum `tracks` with `gains` and clip the result
pub fn mix(tracks: &[&AudioBuffer], gains: &GainVector) -> MergeResult<AudioBuffer> {
    let mut out = sum_tracks(tracks, gains)?;
    let clipped = clip(&mut out);
    if clipped > 0 {
        log::debug!(
            "Mix clipped {} of {} samples",
            clipped,
            out.frames() * out.num_channels()
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constant(channels: usize, frames: usize, value: f32) -> AudioBuffer {
        AudioBuffer {
            channels: vec![vec![value; frames]; channels],
            sample_rate: 44100,
        }
    }

    fn ramp(frames: usize) -> AudioBuffer {
        AudioBuffer {
            channels: vec![
                (0..frames).map(|i| i as f32 / frames as f32 * 0.5).collect(),
                (0..frames).map(|i| -(i as f32) / frames as f32 * 0.5).collect(),
            ],
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_single_track_unity_is_identity() {
        let track = ramp(1000);
        let out = mix(&[&track], &GainVector::unity(1)).unwrap();
        assert_eq!(out, track);
    }

    #[test]
    fn test_output_spans_longest_track() {
        let long = constant(2, 300, 0.25);
        let short = constant(2, 100, 0.5);
        let gains = GainVector::new(vec![100, 100]).unwrap();
        let out = mix(&[&long, &short], &gains).unwrap();

        assert_eq!(out.frames(), 300);
        // Overlap carries both, tail carries only the long track
        assert_relative_eq!(out.channels[0][50], 0.75);
        assert_relative_eq!(out.channels[1][299], 0.25);

        let long_only = mix(&[&long], &GainVector::unity(1)).unwrap();
        assert_eq!(&out.channels[0][100..], &long_only.channels[0][100..]);
    }

    #[test]
    fn test_linear_in_gain() {
        let a = ramp(512);
        let b = constant(2, 256, 0.3);
        let base = sum_tracks(&[&a, &b], &GainVector::new(vec![20, 30]).unwrap()).unwrap();
        let doubled = sum_tracks(&[&a, &b], &GainVector::new(vec![40, 60]).unwrap()).unwrap();

        for (x, y) in base.channels.iter().flatten().zip(doubled.channels.iter().flatten()) {
            assert_relative_eq!(*y, 2.0 * *x, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_zero_gain_silences_track() {
        let a = constant(2, 100, 0.5);
        let b = constant(2, 100, 0.9);
        let out = mix(&[&a, &b], &GainVector::new(vec![100, 0]).unwrap()).unwrap();
        assert!(out.channels.iter().flatten().all(|&s| s == 0.5));
    }

    #[test]
    fn test_mono_feeds_both_channels() {
        let mono = constant(1, 100, 0.2);
        let stereo = AudioBuffer {
            channels: vec![vec![0.1; 100], vec![-0.1; 100]],
            sample_rate: 44100,
        };
        let out = mix(&[&mono, &stereo], &GainVector::unity(2)).unwrap();
        assert_eq!(out.num_channels(), 2);
        assert_relative_eq!(out.channels[0][10], 0.3);
        assert_relative_eq!(out.channels[1][10], 0.1);
    }

    #[test]
    fn test_sum_is_clipped() {
        let a = constant(2, 10, 0.8);
        let b = constant(2, 10, -0.8);
        let out = mix(&[&a, &a], &GainVector::unity(2)).unwrap();
        assert!(out.channels.iter().flatten().all(|&s| s == 1.0));
        let out = mix(&[&b, &b], &GainVector::unity(2)).unwrap();
        assert!(out.channels.iter().flatten().all(|&s| s == -1.0));
    }

    #[test]
    fn test_clip_counts_and_scrubs_nan() {
        let mut buf = AudioBuffer {
            channels: vec![vec![0.5, 1.5, f32::NAN, -2.0]],
            sample_rate: 44100,
        };
        assert_eq!(clip(&mut buf), 3);
        assert_eq!(buf.channels[0], vec![0.5, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let a = constant(2, 10, 0.1);
        let mut b = constant(2, 10, 0.1);
        b.sample_rate = 48000;

        assert_eq!(
            mix(&[&a, &b], &GainVector::unity(2)),
            Err(MergeError::SampleRateMismatch {
                index: 1,
                expected: 44100,
                actual: 48000
            })
        );
        assert_eq!(
            mix(&[&a], &GainVector::unity(2)),
            Err(MergeError::GainVectorLengthMismatch {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(mix(&[], &GainVector::unity(0)), Err(MergeError::NotLoaded));
    }
}
