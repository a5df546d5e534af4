//! Scheduling, the voice pool, and live and offline orchestration.

/*
Live Engine
===========

  Stopped ──start()──→ Starting ──ok──→ Running
     ↑                    │                │
     └───── failure ──────┘                │
     └──────────────── stop() ─────────────┘

start()   resume the backend clock, install an effects chain (delay plus a
          freshly synthesized reverb), pick up the walker's current chord,
          first note 100 ms out, first chord change four bars out.

tick(now) called by the host roughly every 50 ms:
          - pick up new parameter snapshots, retune the effects if needed
          - hop the chord if the hop is within the lookahead
          - commit up to three notes that fall within the lookahead

stop()    release every voice and the effects chain, pause the backend.
          Idempotent; every release is best effort.
*/

pub mod allocator;
pub mod control;
pub mod observer;
pub mod offline;
pub mod scheduler;

use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::{
    backend::{AudioGraph, GraphCommand, VoiceId},
    dsp::reverb::ImpulseResponse,
    error::EngineError,
    graph::EffectsChain,
    harmony::{GraphData, PitchClassSet, RelationGraph},
    patch::{EffectSettings, SynthParams},
    sequencing::Tempo,
    synth::{Voice, VoiceSpec},
};

pub use allocator::{ActiveVoice, VoicePool, GRACE_SECONDS, MAX_VOICES};
pub use control::ControlHandle;
pub use observer::{EngineObserver, NullObserver, TracingObserver};
pub use offline::{Exporter, NoteEvent};
pub use scheduler::{quantize_to_sixteenth, NoteScheduler};

/// Octaves a note may land in: `midi = octave * 12 + pitch_class`.
pub const OCTAVES: RangeInclusive<u8> = 4..=6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Starting,
    Running,
}

/// One randomized note drawn from the active set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteChoice {
    pub pitch_class: u8,
    pub midi_note: u8,
    /// Nominal length: the maximum scaled by U(0.5, 1.0)
    pub duration: f64,
}

/// Draw a pitch class, an octave and a length. `None` for an empty set.
pub fn pick_note<R: Rng + ?Sized>(
    set: PitchClassSet,
    max_duration: f64,
    rng: &mut R,
) -> Option<NoteChoice> {
    if set.is_empty() {
        return None;
    }
    let pitch_class = set.nth(rng.gen_range(0..set.len()))?;
    let octave = rng.gen_range(OCTAVES);
    let duration = max_duration * rng.gen_range(0.5..1.0);
    Some(NoteChoice {
        pitch_class,
        midi_note: octave * 12 + pitch_class,
        duration,
    })
}

/// The parameter snapshots the effects chain was last configured from.
struct Applied {
    params: Arc<SynthParams>,
    tempo: Arc<Tempo>,
    settings: EffectSettings,
}

pub struct Engine<G: AudioGraph> {
    graph: G,
    control: ControlHandle,
    walker: RelationGraph,
    rng: StdRng,
    pool: VoicePool,
    scheduler: Option<NoteScheduler>,
    applied: Option<Applied>,
    active_set: PitchClassSet,
    state: PlayState,
    next_voice_id: u64,
    observer: Box<dyn EngineObserver>,
}

impl<G: AudioGraph> Engine<G> {
    /// The walk starts at a uniformly random node of `data`.
    pub fn new(graph: G, data: Arc<GraphData>, control: ControlHandle, mut rng: StdRng) -> Self {
        let walker = RelationGraph::new(data, &mut rng);
        Self {
            graph,
            control,
            walker,
            rng,
            pool: VoicePool::new(MAX_VOICES),
            scheduler: None,
            applied: None,
            active_set: PitchClassSet::EMPTY,
            state: PlayState::Stopped,
            next_voice_id: 0,
            observer: Box::new(NullObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlayState::Running
    }

    pub fn control(&self) -> &ControlHandle {
        &self.control
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn active_set(&self) -> PitchClassSet {
        self.active_set
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn scheduler(&self) -> Option<&NoteScheduler> {
        self.scheduler.as_ref()
    }

    /// Begin playback. On failure everything acquired so far is released and
    /// the engine is back in `Stopped`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state != PlayState::Stopped {
            return Ok(());
        }
        self.state = PlayState::Starting;

        if let Err(err) = self.begin() {
            warn!("engine failed to start: {err}");
            self.stop();
            return Err(err);
        }

        self.state = PlayState::Running;
        self.observer.play_state_changed(true);
        info!(chord = %self.active_set, "engine started");
        Ok(())
    }

    fn begin(&mut self) -> Result<(), EngineError> {
        self.graph.resume()?;

        let params = self.control.params();
        let tempo = self.control.tempo();
        let settings = params.effect_settings(tempo.bpm);
        let sample_rate = self.graph.sample_rate();

        let impulse = match ImpulseResponse::synthesize(sample_rate, &mut self.rng) {
            Ok(impulse) => Some(impulse),
            Err(err) => {
                warn!("reverb unavailable, continuing without it: {err}");
                None
            }
        };
        let chain = EffectsChain::new(&settings, impulse.as_ref(), sample_rate);
        self.graph.send(GraphCommand::BuildEffects {
            chain: Box::new(chain),
        })?;

        self.applied = Some(Applied {
            params,
            tempo: Arc::clone(&tempo),
            settings,
        });
        self.refresh_chord();
        self.scheduler = Some(NoteScheduler::start(self.graph.current_time(), &tempo));
        Ok(())
    }

    /// Release everything and return to `Stopped`. Safe to call at any time.
    pub fn stop(&mut self) {
        if self.state == PlayState::Stopped {
            return;
        }
        let was_running = self.state == PlayState::Running;

        for id in self.pool.drain() {
            self.release(GraphCommand::RemoveVoice { id });
        }
        self.release(GraphCommand::Teardown);
        if let Err(err) = self.graph.suspend() {
            trace!("suspend during stop failed: {err}");
        }

        self.scheduler = None;
        self.applied = None;
        self.state = PlayState::Stopped;
        if was_running {
            self.observer.play_state_changed(false);
            info!("engine stopped");
        }
    }

    pub fn toggle(&mut self) -> Result<PlayState, EngineError> {
        match self.state {
            PlayState::Stopped => self.start()?,
            PlayState::Starting | PlayState::Running => self.stop(),
        }
        Ok(self.state)
    }

    /// Advance the schedule to `now`. Returns how many notes were due.
    pub fn tick(&mut self, now: f64) -> usize {
        if self.state != PlayState::Running {
            return 0;
        }
        let params = self.control.params();
        let tempo = self.control.tempo();
        self.apply_changes(&params, &tempo, now);

        let Some(mut scheduler) = self.scheduler.take() else {
            return 0;
        };

        if scheduler.hop_due(now) {
            self.walker.advance(&mut self.rng);
            self.refresh_chord();
            scheduler.advance_hop(&tempo);
        }

        let mut due = 0;
        while due < scheduler::MAX_TRIGGERS_PER_TICK && scheduler.note_due(now) {
            self.trigger_note(scheduler.trigger_time(now), now, &params, &tempo);
            scheduler.advance_note_with(&tempo, &mut self.rng);
            due += 1;
        }

        self.scheduler = Some(scheduler);
        due
    }

    fn apply_changes(&mut self, params: &Arc<SynthParams>, tempo: &Arc<Tempo>, now: f64) {
        let Some(applied) = self.applied.as_mut() else {
            return;
        };
        if Arc::ptr_eq(&applied.params, params) && Arc::ptr_eq(&applied.tempo, tempo) {
            return;
        }

        let settings = params.effect_settings(tempo.bpm);
        if settings != applied.settings {
            if let Err(err) = self
                .graph
                .send(GraphCommand::ConfigureEffects { settings, at: now })
            {
                warn!("effect update dropped, retrying next tick: {err}");
                return;
            }
            debug!(?settings, "effects reconfigured");
            applied.settings = settings;
        }
        applied.params = Arc::clone(params);
        applied.tempo = Arc::clone(tempo);
    }

    fn refresh_chord(&mut self) {
        self.active_set = self.walker.current();
        let name = self.active_set.display_name();
        debug!(chord = %name, node = self.walker.current_index(), "chord");
        self.observer.chord_changed(&name);
    }

    fn trigger_note(&mut self, time: f64, now: f64, params: &SynthParams, tempo: &Tempo) {
        for id in self.pool.cleanup(now) {
            self.release(GraphCommand::RemoveVoice { id });
        }

        let max_duration = params.max_note_duration.to_seconds(tempo.bpm);
        let Some(note) = pick_note(self.active_set, max_duration, &mut self.rng) else {
            return;
        };

        let id = VoiceId(self.next_voice_id);
        self.next_voice_id += 1;
        let spec = VoiceSpec::new(note.midi_note, time, note.duration, params);
        let tracked = ActiveVoice {
            id,
            start: time,
            end: spec.end_time(),
        };
        if let Some(evicted) = self.pool.push(tracked, now) {
            self.release(GraphCommand::StopVoice {
                id: evicted.id,
                at: now,
            });
        }

        match self.graph.send(GraphCommand::StartVoice {
            id,
            voice: Box::new(Voice::new(spec)),
        }) {
            Ok(()) => {
                debug!(midi = note.midi_note, at = time, duration = note.duration, "note");
                self.observer.note_triggered(note.pitch_class);
            }
            Err(err) => warn!("note dropped: {err}"),
        }
    }

    /// Send a release-type command, swallowing failures.
    fn release(&mut self, command: GraphCommand) {
        if let Err(err) = self.graph.send(command) {
            trace!("release failed: {err}");
        }
    }
}

impl<G: AudioGraph> Drop for Engine<G> {
    fn drop(&mut self) {
        self.stop();
    }
}
