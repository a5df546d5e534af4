use crate::{patch::EnvelopeParams, MIN_TIME};

/*
Time-Anchored ADSR Envelope
===========================

Every note in the engine is scheduled ahead of time: we know its start time
`t0` and its nominal duration `d` before a single sample is rendered. So
instead of a gate-driven state machine that steps once per sample, the
envelope here is a pure function of absolute time.

Vocabulary
----------

  t0          Note start time on the playback clock, in seconds.

  d           Nominal duration. The release begins at t0 + d.

  peak        Headroom constant shared by every voice (0.3). Many voices
              overlap in ambient textures, so each one tops out well below 1.

  sustain     Ratio of peak held between the decay and the release.


The Shape
---------

  Level
   peak ┐     ╱╲
        │    ╱  ╲___________
  peak·S│   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
          t0  +A   +A+D     t0+d   t0+d+R

  attack   0 → peak over A seconds
  decay    peak → peak·S over D seconds
  sustain  hold peak·S until t0 + d
  release  whatever level we are at → 0 over R seconds

If the note is shorter than A + D, the release starts from the level the
attack/decay ramps had reached at t0 + d, so the curve never jumps. With
S = 0 the hold stage is silent and the envelope is attack-decay-release.
*/

/// Headroom shared by all voices so the mixed output stays bounded.
pub const PEAK: f32 = 0.3;

/// The stage an envelope is in at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Before t0 or after the release has finished
    Attack,  // Ramping up to peak
    Decay,   // Ramping down to peak * sustain
    Sustain, // Holding until t0 + d
    Release, // Ramping down to 0
}

/// Piecewise-linear amplitude envelope anchored at a note's start time.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeModel {
    start: f64,
    duration: f64,
    attack: f64,
    decay: f64,
    sustain: f32,
    release: f64,
    peak: f32,
}

impl EnvelopeModel {
    pub fn new(start: f64, duration: f64, params: &EnvelopeParams) -> Self {
        let min = MIN_TIME as f64;
        Self {
            start,
            duration: duration.max(0.0),
            attack: params.attack.max(min),
            decay: params.decay.max(min),
            sustain: params.sustain.clamp(0.0, 1.0),
            release: params.release.max(min),
            peak: PEAK,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    /// Time the release begins.
    pub fn release_start(&self) -> f64 {
        self.start + self.duration
    }

    /// Time the envelope reaches zero for good.
    pub fn end_time(&self) -> f64 {
        self.release_start() + self.release
    }

    /// Level at `elapsed` seconds after t0, ignoring the release.
    fn held_level(&self, elapsed: f64) -> f32 {
        let peak = self.peak as f64;
        let level = if elapsed < self.attack {
            peak * (elapsed / self.attack)
        } else if elapsed < self.attack + self.decay {
            let progress = (elapsed - self.attack) / self.decay;
            let floor = peak * self.sustain as f64;
            peak + (floor - peak) * progress
        } else {
            peak * self.sustain as f64
        };
        level as f32
    }

    pub fn stage_at(&self, time: f64) -> EnvelopeState {
        let elapsed = time - self.start;
        if elapsed < 0.0 || time >= self.end_time() {
            EnvelopeState::Idle
        } else if elapsed >= self.duration {
            EnvelopeState::Release
        } else if elapsed < self.attack {
            EnvelopeState::Attack
        } else if elapsed < self.attack + self.decay {
            EnvelopeState::Decay
        } else {
            EnvelopeState::Sustain
        }
    }

    /// Amplitude at absolute `time`.
    pub fn level_at(&self, time: f64) -> f32 {
        let elapsed = time - self.start;
        if elapsed < 0.0 {
            return 0.0;
        }
        if elapsed < self.duration {
            return self.held_level(elapsed);
        }

        // Release: linear from the level reached at t0 + d down to zero
        let progress = (elapsed - self.duration) / self.release;
        if progress >= 1.0 {
            return 0.0;
        }
        let from = self.held_level(self.duration);
        (from as f64 * (1.0 - progress)).max(0.0) as f32
    }
}
