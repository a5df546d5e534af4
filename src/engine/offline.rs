use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::{
    backend::{offline::StereoBuffer, AudioGraph, GraphCommand, OfflineGraph, VoiceId},
    dsp::reverb::ImpulseResponse,
    engine::{
        pick_note,
        scheduler::{hop_seconds, next_onset},
    },
    error::EncodeError,
    graph::EffectsChain,
    harmony::{GraphData, RelationGraph},
    io::{encode_midi, encode_wav},
    patch::{SynthParams, MAX_FEEDBACK},
    sequencing::Tempo,
    synth::{Voice, VoiceSpec},
};

/*
Offline Generation & Export
===========================

The same stochastic process as live playback, run to completion with its own
seeded RNG and its own walker, so an export depends only on
(graph, params, tempo, seed) and never on what is playing.

  t = 0                                               hyperbars × 8 bars
  ├── note ── note ─── note ── … ─────────────────────────┤
  ├──── 4 bars ────┼──── 4 bars ────┼── …  chord hops

Render length
-------------

  content end   last (start + duration + release)
  delay tail    repeats until −60 dB × delay time
                repeats = ceil(−60 / (20·log10(feedback)))
  reverb tail   impulse length

  length = content end + max(delay tail, reverb tail) + 0.5 s

After rendering, trailing near-silence (below 0.001) that lasts longer than
0.5 s is cut from the end.
*/

/// Bars per hyperbar, the unit offline generation is measured in.
pub const HYPERBAR_BARS: u32 = 8;
pub const TAIL_MARGIN_SECONDS: f64 = 0.5;
pub const SILENCE_THRESHOLD: f32 = 0.001;
pub const SILENCE_HOLD_SECONDS: f64 = 0.5;
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// XORed into the generation seed to seed the export's reverb impulse.
const REVERB_SEED_SALT: u64 = 0x5eed_0f_2e7e_2b00;

/// One generated note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub midi_note: u8,
    pub start_time: f64,
    pub duration: f64,
}

/// Generate `hyperbars × 8` bars of notes, ordered by start time.
pub fn generate_music_data(
    hyperbars: u32,
    data: Arc<GraphData>,
    params: &SynthParams,
    tempo: &Tempo,
    seed: u64,
) -> Vec<NoteEvent> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut walker = RelationGraph::new(data, &mut rng);

    let total = hyperbars as f64 * HYPERBAR_BARS as f64 * tempo.bar_seconds();
    let hop = hop_seconds(tempo);
    let max_duration = params.max_note_duration.to_seconds(tempo.bpm);

    let mut notes = Vec::new();
    let mut next_note = 0.0;
    let mut next_hop = hop;
    while next_note < total {
        while next_hop <= next_note {
            walker.advance(&mut rng);
            next_hop += hop;
        }
        if let Some(choice) = pick_note(walker.current(), max_duration, &mut rng) {
            notes.push(NoteEvent {
                midi_note: choice.midi_note,
                start_time: next_note,
                duration: choice.duration,
            });
        }
        next_note = next_onset(next_note, rng.gen::<f64>(), tempo);
    }

    debug!(notes = notes.len(), hyperbars, seed, "generated");
    notes
}

/// Delay repeats until the feedback loop has decayed by 60 dB.
pub fn feedback_repeats(feedback: f32) -> u32 {
    if feedback.is_nan() || feedback <= 0.0 {
        return 0;
    }
    let feedback = feedback.min(MAX_FEEDBACK) as f64;
    (-60.0 / (20.0 * feedback.log10())).ceil() as u32
}

/// Seconds of audio needed to render `notes` with every tail intact.
pub fn render_length(
    notes: &[NoteEvent],
    params: &SynthParams,
    tempo: &Tempo,
    reverb_tail: f64,
) -> f64 {
    let release = params.envelope.release.max(0.0);
    let content_end = notes
        .iter()
        .map(|note| note.start_time + note.duration + release)
        .fold(0.0, f64::max);

    let settings = params.effect_settings(tempo.bpm);
    let delay_tail = if settings.delay_enabled {
        feedback_repeats(settings.feedback) as f64 * settings.delay_seconds as f64
    } else {
        0.0
    };

    content_end + delay_tail.max(reverb_tail) + TAIL_MARGIN_SECONDS
}

/// Cut trailing audio that stays below the silence threshold for longer
/// than the hold time, keeping the hold time itself.
pub fn trim_trailing_silence(buffer: &mut StereoBuffer, sample_rate: u32) {
    let hold = (SILENCE_HOLD_SECONDS * sample_rate as f64).round() as usize;
    let last_loud = (0..buffer.frames())
        .rev()
        .find(|&i| buffer.left[i].abs().max(buffer.right[i].abs()) >= SILENCE_THRESHOLD);
    let keep = match last_loud {
        Some(index) => index + 1 + hold,
        None => hold,
    };
    if keep < buffer.frames() {
        buffer.truncate(keep);
    }
}

/// Offline renderer and encoders over one fixed configuration.
#[derive(Debug, Clone)]
pub struct Exporter {
    data: Arc<GraphData>,
    params: SynthParams,
    tempo: Tempo,
    seed: u64,
    sample_rate: u32,
}

impl Exporter {
    pub fn new(data: Arc<GraphData>, params: SynthParams, tempo: Tempo, seed: u64) -> Self {
        Self {
            data,
            params: params.clamped(),
            tempo: tempo.clamped(),
            seed,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    pub fn generate(&self, hyperbars: u32) -> Vec<NoteEvent> {
        generate_music_data(
            hyperbars,
            Arc::clone(&self.data),
            &self.params,
            &self.tempo,
            self.seed,
        )
    }

    /// Render `notes` through the full voice and effects chain, tails
    /// included and trailing silence trimmed.
    pub fn render(&self, notes: &[NoteEvent]) -> Result<StereoBuffer, EncodeError> {
        let sample_rate = self.sample_rate as f32;
        let mut graph = OfflineGraph::new(sample_rate);
        graph.resume()?;

        let mut rng = StdRng::seed_from_u64(self.seed ^ REVERB_SEED_SALT);
        let impulse = match ImpulseResponse::synthesize(sample_rate, &mut rng) {
            Ok(impulse) => Some(impulse),
            Err(err) => {
                warn!("reverb unavailable, rendering dry: {err}");
                None
            }
        };
        let reverb_tail = impulse
            .as_ref()
            .map(|impulse| impulse.duration_seconds() as f64)
            .unwrap_or(0.0);

        let settings = self.params.effect_settings(self.tempo.bpm);
        graph.send(GraphCommand::BuildEffects {
            chain: Box::new(EffectsChain::new(&settings, impulse.as_ref(), sample_rate)),
        })?;
        for (index, note) in notes.iter().enumerate() {
            let spec = VoiceSpec::new(note.midi_note, note.start_time, note.duration, &self.params);
            graph.send(GraphCommand::StartVoice {
                id: VoiceId(index as u64),
                voice: Box::new(Voice::new(spec)),
            })?;
        }

        let seconds = render_length(notes, &self.params, &self.tempo, reverb_tail);
        let frames = (seconds * self.sample_rate as f64).ceil() as usize;
        let mut buffer = graph.render(frames);
        graph.suspend()?;

        trim_trailing_silence(&mut buffer, self.sample_rate);
        Ok(buffer)
    }

    pub fn export_wav(&self, notes: &[NoteEvent]) -> Result<Vec<u8>, EncodeError> {
        let buffer = self.render(notes)?;
        let bytes = encode_wav(&buffer, self.sample_rate)?;
        info!(
            notes = notes.len(),
            frames = buffer.frames(),
            bytes = bytes.len(),
            "exported WAV"
        );
        Ok(bytes)
    }

    pub fn export_midi(&self, notes: &[NoteEvent]) -> Result<Vec<u8>, EncodeError> {
        let bytes = encode_midi(notes, self.tempo.bpm)?;
        info!(notes = notes.len(), bytes = bytes.len(), "exported MIDI");
        Ok(bytes)
    }
}
