//! Real-world scenario benchmarks.
//!
//! These model what the audio callback does during playback: a handful of
//! overlapping voices summed into the delay and reverb.

mod chain;
mod voices;

pub use chain::bench_chain;
pub use voices::bench_voices;
