//! Combine Benchmarks
//!
//! Mixer throughput and end-to-end combine with a warm and a cold decode cache.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tm_codec::{AudioBuffer, AudioEncoder, LameMp3Encoder, Mp3Config};
use tm_engine::{mixer, EngineConfig, GainVector, MergeEngine, TrackSource};

const SAMPLE_RATE: u32 = 44100;
const TRACK_COUNTS: &[usize] = &[2, 4, 8];

fn tone(freq: f32, seconds: f32) -> AudioBuffer {
    let frames = (seconds * SAMPLE_RATE as f32) as usize;
    let plane: Vec<f32> = (0..frames)
        .map(|i| 0.3 * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect();
    AudioBuffer {
        channels: vec![plane.clone(), plane],
        sample_rate: SAMPLE_RATE,
    }
}

fn sources(count: usize, seconds: f32) -> Vec<TrackSource> {
    let encoder = LameMp3Encoder::new(Mp3Config::default());
    (0..count)
        .map(|i| {
            let bytes = encoder
                .encode(&tone(220.0 * (i + 1) as f32, seconds))
                .expect("encode fixture");
            TrackSource::new(format!("track{}.mp3", i), bytes)
        })
        .collect()
}

/// Benchmark the raw gain-sum-clip step
fn bench_mixer(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixer");

    for &count in TRACK_COUNTS {
        let tracks: Vec<AudioBuffer> = (0..count).map(|i| tone(110.0 * (i + 1) as f32, 5.0)).collect();
        let refs: Vec<&AudioBuffer> = tracks.iter().collect();
        let gains = GainVector::new(vec![70; count]).expect("gains in range");

        group.throughput(Throughput::Elements((count * 5 * SAMPLE_RATE as usize) as u64));
        group.bench_with_input(BenchmarkId::new("mix", count), &count, |b, _| {
            b.iter(|| black_box(mixer::mix(&refs, &gains)))
        });
    }

    group.finish();
}

/// Benchmark full combine: mix + encode, with and without the decode cache
fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");
    group.sample_size(10);

    for &count in TRACK_COUNTS {
        let gains = vec![60u8; count];

        let cached = MergeEngine::new(EngineConfig::live_preview());
        cached.ingest(sources(count, 3.0)).expect("ingest");
        group.bench_with_input(BenchmarkId::new("cached", count), &count, |b, _| {
            b.iter(|| black_box(cached.combine(&gains)))
        });

        let uncached = MergeEngine::new(EngineConfig::live_preview().with_cache(false));
        uncached.ingest(sources(count, 3.0)).expect("ingest");
        group.bench_with_input(BenchmarkId::new("uncached", count), &count, |b, _| {
            b.iter(|| black_box(uncached.combine(&gains)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mixer, bench_combine);
criterion_main!(benches);
