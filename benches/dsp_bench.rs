//! Realtime budget benchmarks.
//!
//! Run with: cargo bench
//!
//! The audio callback has to fill a block before the device drains the last
//! one. At 48 kHz that leaves 1.33 ms for 64 frames and 10.67 ms for 512;
//! the full chain with a 3 s convolution reverb is the number to watch.
//!
//! Groups:
//!   - dsp/*        primitives (oscillator, biquad and cascade, envelope, delay, convolution)
//!   - scenarios/*  one voice, and voices summed through delay and reverb

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Callback sizes seen on common devices.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];
pub const SAMPLE_RATE: f32 = 48_000.0;

criterion_group!(
    benches,
    // Low-level DSP primitives
    dsp::bench_oscillator,
    dsp::bench_filter,
    dsp::bench_envelope,
    dsp::bench_delay,
    dsp::bench_reverb,
    // Real-world scenarios
    scenarios::bench_voices,
    scenarios::bench_chain,
);
criterion_main!(benches);
