//! Benchmarks for impulse synthesis and partitioned convolution.

use std::hint::black_box;

use ambient_walk::dsp::reverb::{ImpulseResponse, PartitionedConvolver};
use criterion::{BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    group.bench_function("synthesize_impulse", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| ImpulseResponse::synthesize(black_box(SAMPLE_RATE), &mut rng))
    });

    let mut rng = StdRng::seed_from_u64(2);
    let impulse = match ImpulseResponse::synthesize(SAMPLE_RATE, &mut rng) {
        Ok(impulse) => impulse,
        Err(err) => panic!("impulse synthesis failed: {err}"),
    };

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0)
                } else {
                    (i as f32 * 0.05).sin() * 0.1
                }
            })
            .collect();

        // One channel of the full 3 s impulse
        let mut convolver = PartitionedConvolver::new(&impulse.left);
        group.bench_with_input(BenchmarkId::new("convolve_3s", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += convolver.process(black_box(sample));
                }
                sum
            })
        });
    }

    group.finish();
}
