//! Low Frequency Oscillator (LFO) helpers for vibrato and tremolo.

/*
Low Frequency Oscillators
=========================

An LFO is the same sine oscillator as the carrier, run at control rate
(roughly 0.01 Hz to 20 Hz). Every voice owns two of them.

Vocabulary
----------

  bipolar         Output swings positive AND negative: -1.0 to +1.0.
                  Vibrato uses it: pitch goes sharp and flat around f0.

  unipolar        Output is only positive: 0.0 to 1.0.
                  Tremolo uses it: amplitude only ever dips below full.
                  Convert: unipolar = (bipolar + 1.0) / 2.0

  depth           How far the modulated value moves. For vibrato it is a
                  fraction of the carrier frequency, for tremolo a fraction
                  of the envelope-shaped amplitude.


Vibrato
-------

    f(t) = f0 * (1 + depth * lfo(t))

With depth = 0.01 the pitch wanders about a sixth of a semitone either way.
The carrier integrates f(t) into its phase, so the modulation never clicks.


Tremolo
-------

    gain(t) = 1 - depth * unipolar(lfo(t))

    unipolar   gain
    0.0        1.0
    0.5        1 - depth/2
    1.0        1 - depth

So the gain moves between (1 - depth) and 1 and never exceeds unity, which
keeps the envelope's headroom intact.
*/

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Instantaneous vibrato frequency for a bipolar LFO sample.
#[inline]
pub fn vibrato_frequency(base_hz: f32, lfo: f32, depth: f32) -> f32 {
    base_hz * (1.0 + depth * lfo)
}

/// Tremolo gain in `[1 - depth, 1]` for a bipolar LFO sample.
///
/// # Example
/// ```
/// use ambient_walk::dsp::lfo::tremolo_gain;
/// assert!((tremolo_gain(1.0, 0.2) - 0.8).abs() < 1e-6); // deepest dip
/// assert!((tremolo_gain(-1.0, 0.2) - 1.0).abs() < 1e-6); // full level
/// ```
#[inline]
pub fn tremolo_gain(lfo: f32, depth: f32) -> f32 {
    1.0 - depth.clamp(0.0, 1.0) * bipolar_to_unipolar(lfo)
}
