//! Benchmarks for the biquad stage and the filter cascade.

use std::hint::black_box;

use ambient_walk::dsp::filter::SVFilter;
use ambient_walk::graph::filter::FilterCascade;
use ambient_walk::dsp::filter::FilterType;
use ambient_walk::patch::FilterOrder;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Sawtooth-like ramp
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let mut filter = SVFilter::lowpass(2000.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("stage", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), SAMPLE_RATE);
            })
        });

        for order in [FilterOrder::Six, FilterOrder::Twelve, FilterOrder::TwentyFour] {
            let mut cascade =
                FilterCascade::new(order, FilterType::LowPass, 2000.0, 0.707);
            let name = format!("cascade_{}db", order.db_per_octave());
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for &sample in &input {
                        sum += cascade.process(black_box(sample), SAMPLE_RATE);
                    }
                    sum
                })
            });
        }
    }

    group.finish();
}
