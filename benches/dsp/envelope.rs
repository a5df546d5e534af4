//! Benchmarks for envelope evaluation.

use std::hint::black_box;

use ambient_walk::dsp::EnvelopeModel;
use ambient_walk::patch::EnvelopeParams;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let env = EnvelopeModel::new(0.0, 4.0, &EnvelopeParams::default());
    let dt = 1.0 / SAMPLE_RATE as f64;

    for &size in BLOCK_SIZES {
        // Evaluated across the attack/decay boundary
        let start = 1.4;
        group.bench_with_input(BenchmarkId::new("level_at", size), &size, |b, &size| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..size {
                    sum += env.level_at(black_box(start + i as f64 * dt));
                }
                sum
            })
        });
    }

    group.finish();
}
