//! Benchmarks for the sine oscillator.

use std::hint::black_box;

use ambient_walk::dsp::oscillator::OscillatorBlock;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut osc = OscillatorBlock::new();
        group.bench_with_input(BenchmarkId::new("fixed", size), &size, |b, _| {
            b.iter(|| osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE))
        });

        // Vibrato-style per-sample frequencies
        let freqs: Vec<f32> = (0..size)
            .map(|i| 440.0 * (1.0 + 0.004 * (i as f32 * 0.01).sin()))
            .collect();
        let mut osc = OscillatorBlock::new();
        group.bench_with_input(BenchmarkId::new("modulated", size), &size, |b, _| {
            b.iter(|| osc.render_modulated(black_box(&mut buffer), black_box(&freqs), SAMPLE_RATE))
        });
    }

    group.finish();
}
