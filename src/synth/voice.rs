use crate::{
    dsp::{
        envelope::EnvelopeModel,
        lfo::{tremolo_gain, vibrato_frequency},
        oscillator::OscillatorBlock,
    },
    graph::{
        lfo::LfoNode,
        node::{midi_note_to_freq, GraphNode, RenderCtx},
    },
    patch::{EnvelopeParams, SynthParams, TremoloParams, VibratoParams},
};

/*
Voice
=====

One note: a sine carrier, a vibrato LFO bending its pitch, a tremolo LFO
shaping its level, and a time-anchored envelope.

  vibrato LFO ──→ f(t) = f0 (1 + depth · lfo)
                     │
                     ▼
                [ sine carrier ] ──(× envelope(t))──(× tremolo gain)──(× stop fade)──→ out

A voice knows its own start time, so it can be handed to the audio thread
ahead of time and will stay silent until its first sample comes round. It
is finished once the envelope's release has ended, or 10 ms after a forced
stop.
*/

/// Fade applied when a voice is cut short.
pub const STOP_FADE_SECONDS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Scheduled, // Waiting for its start time
    Sounding,  // Between start and end of release
    Stopping,  // Fading out after a forced stop
    Finished,  // Silent for good
}

/// Everything needed to build a voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSpec {
    pub midi_note: u8,
    /// Onset on the playback clock, in seconds
    pub start: f64,
    /// Nominal duration; the release starts at `start + duration`
    pub duration: f64,
    pub envelope: EnvelopeParams,
    pub vibrato: VibratoParams,
    pub tremolo: TremoloParams,
}

impl VoiceSpec {
    pub fn new(midi_note: u8, start: f64, duration: f64, params: &SynthParams) -> Self {
        Self {
            midi_note,
            start,
            duration,
            envelope: params.envelope,
            vibrato: params.vibrato,
            tremolo: params.tremolo,
        }
    }

    pub fn frequency(&self) -> f32 {
        midi_note_to_freq(self.midi_note)
    }

    pub fn envelope_model(&self) -> EnvelopeModel {
        EnvelopeModel::new(self.start, self.duration, &self.envelope)
    }

    /// `start + duration + release`
    pub fn end_time(&self) -> f64 {
        self.envelope_model().end_time()
    }
}

pub struct Voice {
    spec: VoiceSpec,
    carrier: OscillatorBlock,
    vibrato: LfoNode,
    tremolo: LfoNode,
    envelope: EnvelopeModel,
    frequency: f32,
    stop_at: Option<f64>,
    state: VoiceState,
}

impl Voice {
    pub fn new(spec: VoiceSpec) -> Self {
        Self {
            carrier: OscillatorBlock::new(),
            vibrato: LfoNode::sine(spec.vibrato.rate),
            tremolo: LfoNode::sine(spec.tremolo.rate),
            envelope: spec.envelope_model(),
            frequency: spec.frequency(),
            stop_at: None,
            state: VoiceState::Scheduled,
            spec,
        }
    }

    pub fn spec(&self) -> &VoiceSpec {
        &self.spec
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Fade out over 10 ms starting at `at`. An earlier stop wins.
    pub fn stop(&mut self, at: f64) {
        self.stop_at = Some(match self.stop_at {
            Some(existing) => existing.min(at),
            None => at,
        });
    }

    /// Time after which the voice renders nothing.
    pub fn end_time(&self) -> f64 {
        let natural = self.envelope.end_time();
        match self.stop_at {
            Some(at) => natural.min(at + STOP_FADE_SECONDS),
            None => natural,
        }
    }

    #[inline]
    fn stop_gain(&self, time: f64) -> f32 {
        match self.stop_at {
            Some(at) if time >= at => (1.0 - (time - at) / STOP_FADE_SECONDS).max(0.0) as f32,
            _ => 1.0,
        }
    }
}

impl GraphNode for Voice {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let sample_rate = ctx.sample_rate;
        let end = self.end_time();

        for (i, sample) in out.iter_mut().enumerate() {
            let time = ctx.sample_time(i);
            if time < self.spec.start {
                *sample = 0.0;
                continue;
            }
            if time >= end {
                self.state = VoiceState::Finished;
                *sample = 0.0;
                continue;
            }

            let stop_gain = self.stop_gain(time);
            self.state = if stop_gain < 1.0 {
                VoiceState::Stopping
            } else {
                VoiceState::Sounding
            };

            let frequency = vibrato_frequency(
                self.frequency,
                self.vibrato.next_value(sample_rate),
                self.spec.vibrato.depth,
            );
            let tremolo = tremolo_gain(
                self.tremolo.next_value(sample_rate),
                self.spec.tremolo.depth,
            );
            let level = self.envelope.level_at(time);

            *sample = self.carrier.next_sample(frequency, sample_rate) * level * tremolo * stop_gain;
        }
    }

    fn is_active(&self) -> bool {
        self.state != VoiceState::Finished
    }
}
