//! Benchmarks for delay line operations.

use std::hint::black_box;

use ambient_walk::dsp::delay::DelayLine;
use ambient_walk::patch::MAX_DELAY_SECONDS;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in seconds
    let delay_times: &[f32] = &[0.01, 0.375, 1.5];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &seconds in delay_times {
            let mut delay = DelayLine::with_max_seconds(MAX_DELAY_SECONDS, SAMPLE_RATE);
            let delay_samples = seconds * SAMPLE_RATE;
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("render_{}ms", (seconds * 1000.0) as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        delay.render(black_box(&mut buffer), black_box(delay_samples));
                    })
                },
            );
        }

        // Gliding delay time, as during a tempo change
        let mut delay = DelayLine::with_max_seconds(MAX_DELAY_SECONDS, SAMPLE_RATE);
        for &sample in &input {
            delay.write(sample);
        }
        group.bench_with_input(BenchmarkId::new("read_interpolated", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..size {
                    let delay_time = 18_000.0 + i as f32 * 0.37;
                    sum += delay.read_interpolated(black_box(delay_time));
                }
                sum
            })
        });
    }

    group.finish();
}
