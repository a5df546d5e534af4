use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{
    patch::{ParamsUpdate, SynthParams},
    sequencing::Tempo,
};

/// Thread-safe handle for changing what the engine plays.
///
/// Each setter builds a complete new snapshot and swaps it in atomically, so
/// a tick always sees either the old values or the new ones, never a mix.
/// Clones share the same snapshots.
#[derive(Clone)]
pub struct ControlHandle {
    params: Arc<ArcSwap<SynthParams>>,
    tempo: Arc<ArcSwap<Tempo>>,
}

impl ControlHandle {
    pub fn new(params: SynthParams, tempo: Tempo) -> Self {
        Self {
            params: Arc::new(ArcSwap::from_pointee(params.clamped())),
            tempo: Arc::new(ArcSwap::from_pointee(tempo.clamped())),
        }
    }

    pub fn params(&self) -> Arc<SynthParams> {
        self.params.load_full()
    }

    pub fn tempo(&self) -> Arc<Tempo> {
        self.tempo.load_full()
    }

    /// Apply only the fields present in `update`.
    pub fn update_params(&self, update: &ParamsUpdate) {
        self.params
            .rcu(|current| Arc::new(current.with_update(update)));
    }

    pub fn set_params(&self, params: SynthParams) {
        self.params.store(Arc::new(params.clamped()));
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.tempo
            .rcu(|current| Arc::new(Tempo::new(bpm, current.mean_notes_per_bar)));
    }

    pub fn set_mean_notes_per_bar(&self, mean_notes_per_bar: f64) {
        self.tempo
            .rcu(|current| Arc::new(Tempo::new(current.bpm, mean_notes_per_bar)));
    }
}

impl Default for ControlHandle {
    fn default() -> Self {
        Self::new(SynthParams::default(), Tempo::default())
    }
}
