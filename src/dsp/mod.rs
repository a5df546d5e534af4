//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! These components are allocation-free once built and realtime-safe, making
//! them safe to embed directly inside voices and effects. They stay focused
//! on the signal-processing math so graph nodes can layer on orchestration
//! and parameter handling.

/// Fractional delay line.
pub mod delay;
/// Time-anchored attack/decay/sustain/release envelope.
pub mod envelope;
/// State-variable biquad stage with low/band/high-pass responses.
pub mod filter;
/// Vibrato and tremolo helpers.
pub mod lfo;
/// Sine oscillator.
pub mod oscillator;
/// Synthetic impulse responses and partitioned convolution.
pub mod reverb;
/// Linear parameter ramps.
pub mod smoothing;

pub use envelope::{EnvelopeModel, EnvelopeState};
