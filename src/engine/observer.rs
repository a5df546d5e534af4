use tracing::{debug, info};

/// Optional notifications for a control surface or platform integration.
///
/// Every method defaults to doing nothing; the engine never depends on an
/// observer for correctness.
pub trait EngineObserver: Send {
    /// A new pitch-class set is active.
    fn chord_changed(&mut self, _name: &str) {}

    /// A note was committed to the backend.
    fn note_triggered(&mut self, _pitch_class: u8) {}

    fn play_state_changed(&mut self, _playing: bool) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl EngineObserver for NullObserver {}

/// Observer that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn chord_changed(&mut self, name: &str) {
        info!(chord = name, "chord changed");
    }

    fn note_triggered(&mut self, pitch_class: u8) {
        debug!(pitch_class, "note");
    }

    fn play_state_changed(&mut self, playing: bool) {
        info!(playing, "play state changed");
    }
}
