//! Render nodes built on the dsp primitives.
//!
//! Nodes add what the raw math lacks: block rendering against a clock,
//! parameter glides, and rebuilding when a setting changes shape.

/// Feedback delay with a filter cascade in the loop.
pub mod delay;
/// Delay followed by reverb, mono in and stereo out.
pub mod effects;
/// Chain of identical biquad stages.
pub mod filter;
/// Low frequency oscillators for vibrato and tremolo.
pub mod lfo;
/// Core traits shared by all graph nodes.
pub mod node;
/// Stereo convolution reverb.
pub mod reverb;

pub use effects::EffectsChain;
pub use node::{midi_note_to_freq, GraphNode, RenderCtx};
