//! Synth parameters: the values every voice and the effects chain are built from.
//!
//! `SynthParams` is an immutable snapshot. A control surface never edits one
//! in place; it describes the fields it changed with a [`ParamsUpdate`] and
//! the engine swaps in `params.with_update(&update)` as a whole.

use serde::{Deserialize, Serialize};

use crate::dsp::filter::{FilterType, MAX_Q, MIN_Q};
use crate::sequencing::Duration;

pub const MAX_FEEDBACK: f32 = 0.95;
pub const MIN_FILTER_HZ: f32 = 10.0;
pub const MAX_FILTER_HZ: f32 = 20_000.0;

/// Longest delay a patch may ask for.
pub const MAX_DELAY_DURATION: Duration = Duration::WHOLE.dotted();
/// [`MAX_DELAY_DURATION`] at the slowest tempo: the longest delay any line
/// has to hold.
pub const MAX_DELAY_SECONDS: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    /// Seconds from silence to peak
    pub attack: f64,
    /// Seconds from peak to the sustain level
    pub decay: f64,
    /// Ratio of peak held until release
    pub sustain: f32,
    /// Seconds from release start to silence
    pub release: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 1.5,
            decay: 1.0,
            sustain: 0.5,
            release: 3.0,
        }
    }
}

/// Sinusoidal pitch modulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibratoParams {
    pub rate: f32,
    /// Deviation as a fraction of the carrier frequency
    pub depth: f32,
}

impl Default for VibratoParams {
    fn default() -> Self {
        Self {
            rate: 5.0,
            depth: 0.004,
        }
    }
}

/// Sinusoidal amplitude modulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TremoloParams {
    pub rate: f32,
    /// Gain dips to `1 - depth` at the bottom of each cycle
    pub depth: f32,
}

impl Default for TremoloParams {
    fn default() -> Self {
        Self {
            rate: 3.0,
            depth: 0.2,
        }
    }
}

/// Slope of the delay's filter cascade, in dB per octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FilterOrder {
    Six,
    Twelve,
    TwentyFour,
}

impl FilterOrder {
    pub fn db_per_octave(self) -> u8 {
        match self {
            FilterOrder::Six => 6,
            FilterOrder::Twelve => 12,
            FilterOrder::TwentyFour => 24,
        }
    }

    /// Number of biquad stages in the cascade: one per 6 dB/octave.
    pub fn stages(self) -> usize {
        self.db_per_octave() as usize / 6
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filter order must be 6, 12 or 24 dB/octave, got {0}")]
pub struct InvalidFilterOrder(pub u8);

impl TryFrom<u8> for FilterOrder {
    type Error = InvalidFilterOrder;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            6 => Ok(FilterOrder::Six),
            12 => Ok(FilterOrder::Twelve),
            24 => Ok(FilterOrder::TwentyFour),
            other => Err(InvalidFilterOrder(other)),
        }
    }
}

impl From<FilterOrder> for u8 {
    fn from(value: FilterOrder) -> Self {
        value.db_per_octave()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayParams {
    pub enabled: bool,
    /// Delay time as a musical length, re-timed whenever the tempo changes
    pub duration: Duration,
    pub feedback: f32,
    pub mix: f32,
    pub filter_type: FilterType,
    pub filter_frequency: f32,
    pub filter_resonance: f32,
    pub filter_order: FilterOrder,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Duration::DOTTED_QUARTER,
            feedback: 0.4,
            mix: 0.3,
            filter_type: FilterType::LowPass,
            filter_frequency: 2_000.0,
            filter_resonance: std::f32::consts::FRAC_1_SQRT_2,
            filter_order: FilterOrder::Twelve,
        }
    }
}

/// Upper bound on a note's nominal length.
///
/// Written as a duration string (`"1/1"`, `"1/2d"`) it follows the tempo;
/// written as a number it is a fixed count of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteLength {
    Musical(Duration),
    Seconds(f64),
}

impl NoteLength {
    pub fn to_seconds(&self, bpm: f64) -> f64 {
        match self {
            NoteLength::Musical(duration) => duration.to_seconds(bpm),
            NoteLength::Seconds(seconds) => *seconds,
        }
    }
}

impl Default for NoteLength {
    fn default() -> Self {
        NoteLength::Musical(Duration::WHOLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub envelope: EnvelopeParams,
    pub vibrato: VibratoParams,
    pub tremolo: TremoloParams,
    pub delay: DelayParams,
    pub max_note_duration: NoteLength,
}

/// Only the fields a control surface changed. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsUpdate {
    pub attack: Option<f64>,
    pub decay: Option<f64>,
    pub sustain: Option<f32>,
    pub release: Option<f64>,
    pub vibrato_rate: Option<f32>,
    pub vibrato_depth: Option<f32>,
    pub tremolo_rate: Option<f32>,
    pub tremolo_depth: Option<f32>,
    pub delay_enabled: Option<bool>,
    pub delay_duration: Option<Duration>,
    pub feedback: Option<f32>,
    pub mix: Option<f32>,
    pub filter_type: Option<FilterType>,
    pub filter_frequency: Option<f32>,
    pub filter_resonance: Option<f32>,
    pub filter_order: Option<FilterOrder>,
    pub max_note_duration: Option<NoteLength>,
}

impl SynthParams {
    /// A new snapshot with `update` applied and every field pulled into range.
    pub fn with_update(&self, update: &ParamsUpdate) -> Self {
        let mut next = *self;
        let env = &mut next.envelope;
        overwrite(&mut env.attack, update.attack);
        overwrite(&mut env.decay, update.decay);
        overwrite(&mut env.sustain, update.sustain);
        overwrite(&mut env.release, update.release);

        overwrite(&mut next.vibrato.rate, update.vibrato_rate);
        overwrite(&mut next.vibrato.depth, update.vibrato_depth);
        overwrite(&mut next.tremolo.rate, update.tremolo_rate);
        overwrite(&mut next.tremolo.depth, update.tremolo_depth);

        let delay = &mut next.delay;
        overwrite(&mut delay.enabled, update.delay_enabled);
        overwrite(&mut delay.duration, update.delay_duration);
        overwrite(&mut delay.feedback, update.feedback);
        overwrite(&mut delay.mix, update.mix);
        overwrite(&mut delay.filter_type, update.filter_type);
        overwrite(&mut delay.filter_frequency, update.filter_frequency);
        overwrite(&mut delay.filter_resonance, update.filter_resonance);
        overwrite(&mut delay.filter_order, update.filter_order);

        overwrite(&mut next.max_note_duration, update.max_note_duration);
        next.clamped()
    }

    pub fn clamped(mut self) -> Self {
        let env = &mut self.envelope;
        env.attack = non_negative(env.attack);
        env.decay = non_negative(env.decay);
        env.release = non_negative(env.release);
        env.sustain = unit(env.sustain);

        self.vibrato.rate = non_negative(self.vibrato.rate as f64) as f32;
        self.vibrato.depth = unit(self.vibrato.depth);
        self.tremolo.rate = non_negative(self.tremolo.rate as f64) as f32;
        self.tremolo.depth = unit(self.tremolo.depth);

        let delay = &mut self.delay;
        delay.feedback = unit(delay.feedback).min(MAX_FEEDBACK);
        delay.mix = unit(delay.mix);
        if delay.duration.is_longer_than(MAX_DELAY_DURATION) {
            delay.duration = MAX_DELAY_DURATION;
        }
        delay.filter_frequency = if delay.filter_frequency.is_finite() {
            delay.filter_frequency.clamp(MIN_FILTER_HZ, MAX_FILTER_HZ)
        } else {
            DelayParams::default().filter_frequency
        };
        delay.filter_resonance = if delay.filter_resonance.is_finite() {
            delay.filter_resonance.clamp(MIN_Q, MAX_Q)
        } else {
            DelayParams::default().filter_resonance
        };

        if let NoteLength::Seconds(seconds) = &mut self.max_note_duration {
            *seconds = non_negative(*seconds);
        }
        self
    }

    /// Effect settings for this snapshot at `bpm`.
    pub fn effect_settings(&self, bpm: f64) -> EffectSettings {
        let delay = &self.delay;
        EffectSettings {
            delay_enabled: delay.enabled,
            delay_seconds: (delay.duration.to_seconds(bpm) as f32).min(MAX_DELAY_SECONDS),
            feedback: delay.feedback,
            mix: delay.mix,
            filter_type: delay.filter_type,
            filter_frequency: delay.filter_frequency,
            filter_q: delay.filter_resonance,
            filter_order: delay.filter_order,
        }
    }
}

/// Everything the effects chain needs, resolved to plain numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSettings {
    pub delay_enabled: bool,
    pub delay_seconds: f32,
    pub feedback: f32,
    pub mix: f32,
    pub filter_type: FilterType,
    pub filter_frequency: f32,
    pub filter_q: f32,
    pub filter_order: FilterOrder,
}

impl Default for EffectSettings {
    fn default() -> Self {
        SynthParams::default().effect_settings(60.0)
    }
}

fn overwrite<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
