//! Benchmarks for a single voice.

use std::hint::black_box;

use ambient_walk::graph::{GraphNode, RenderCtx};
use ambient_walk::patch::SynthParams;
use ambient_walk::synth::{Voice, VoiceSpec};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let params = SynthParams::default();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine carrier with vibrato, tremolo and envelope, in its sustain stage
        let mut voice = Voice::new(VoiceSpec::new(64, 0.0, 60.0, &params));
        let ctx = RenderCtx::new(SAMPLE_RATE, 10.0);
        group.bench_with_input(BenchmarkId::new("sustaining", size), &size, |b, _| {
            b.iter(|| voice.render_block(black_box(&mut buffer), black_box(&ctx)))
        });

        // Not yet started: should cost next to nothing
        let mut voice = Voice::new(VoiceSpec::new(64, 100.0, 4.0, &params));
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);
        group.bench_with_input(BenchmarkId::new("scheduled", size), &size, |b, _| {
            b.iter(|| voice.render_block(black_box(&mut buffer), black_box(&ctx)))
        });
    }

    group.finish();
}
