//! Command protocol between the engine and whatever renders its audio.
//!
//! The engine never touches signal nodes directly. It sends time-stamped
//! [`GraphCommand`]s to an [`AudioGraph`] and reads back its clock; the
//! same wiring code therefore drives the sound card and the offline
//! renderer.

pub mod chain;
pub mod offline;
#[cfg(feature = "rtrb")]
pub mod realtime;

use std::collections::VecDeque;
use std::fmt;

use crate::{error::BackendError, graph::EffectsChain, patch::EffectSettings, synth::Voice};

pub use chain::SignalChain;
pub use offline::OfflineGraph;
#[cfg(feature = "rtrb")]
pub use realtime::RealtimeGraph;

/// Identifies a voice between the engine and the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

pub enum GraphCommand {
    /// Install a freshly built effects chain, replacing any previous one.
    BuildEffects { chain: Box<EffectsChain> },
    /// Glide the current chain towards new settings, starting at `at`.
    ConfigureEffects { settings: EffectSettings, at: f64 },
    /// Add a voice. It stays silent until its own start time.
    StartVoice { id: VoiceId, voice: Box<Voice> },
    /// Fade a voice out over 10 ms from `at`.
    StopVoice { id: VoiceId, at: f64 },
    /// Drop a voice immediately.
    RemoveVoice { id: VoiceId },
    /// Drop every voice and the effects chain.
    Teardown,
}

impl fmt::Debug for GraphCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphCommand::BuildEffects { chain } => f
                .debug_struct("BuildEffects")
                .field("reverb", &chain.has_reverb())
                .finish(),
            GraphCommand::ConfigureEffects { settings, at } => f
                .debug_struct("ConfigureEffects")
                .field("settings", settings)
                .field("at", at)
                .finish(),
            GraphCommand::StartVoice { id, voice } => f
                .debug_struct("StartVoice")
                .field("id", id)
                .field("spec", voice.spec())
                .finish(),
            GraphCommand::StopVoice { id, at } => f
                .debug_struct("StopVoice")
                .field("id", id)
                .field("at", at)
                .finish(),
            GraphCommand::RemoveVoice { id } => {
                f.debug_struct("RemoveVoice").field("id", id).finish()
            }
            GraphCommand::Teardown => f.write_str("Teardown"),
        }
    }
}

/// The capability the engine needs from a playback backend.
pub trait AudioGraph {
    /// Acquire (or resume) the playback clock.
    fn resume(&mut self) -> Result<(), BackendError>;

    /// Pause the playback clock. Safe to call when never resumed.
    fn suspend(&mut self) -> Result<(), BackendError>;

    /// Monotonic playback time in seconds.
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> f32;

    /// Queue a command. Never blocks.
    fn send(&mut self, command: GraphCommand) -> Result<(), BackendError>;
}

/// Source of commands for a [`SignalChain`] running on the audio thread.
pub trait CommandReceiver {
    fn pop(&mut self) -> Option<GraphCommand>;
}

#[cfg(feature = "rtrb")]
impl CommandReceiver for rtrb::Consumer<GraphCommand> {
    fn pop(&mut self) -> Option<GraphCommand> {
        rtrb::Consumer::pop(self).ok()
    }
}

impl CommandReceiver for VecDeque<GraphCommand> {
    fn pop(&mut self) -> Option<GraphCommand> {
        self.pop_front()
    }
}

/// A box the render side no longer needs.
pub enum Retired {
    Voice(Box<Voice>),
    Effects(Box<EffectsChain>),
}

/// Where a [`SignalChain`] hands the boxes it lets go of.
///
/// The realtime backend passes them back to the control thread, which frees
/// them there; an impulse response and its FFT buffers are never dropped
/// inside the audio callback.
pub trait RetireSink {
    fn retire(&mut self, retired: Retired);
}

/// Frees retired boxes on the spot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropRetired;

impl RetireSink for DropRetired {
    fn retire(&mut self, _retired: Retired) {}
}

#[cfg(feature = "rtrb")]
impl RetireSink for rtrb::Producer<Retired> {
    fn retire(&mut self, retired: Retired) {
        // A full ring frees the box here rather than losing track of it
        let _ = self.push(retired);
    }
}

impl RetireSink for Vec<Retired> {
    fn retire(&mut self, retired: Retired) {
        self.push(retired);
    }
}
