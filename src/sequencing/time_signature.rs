use crate::sequencing::Duration;

/// Time signature: beats per bar over the note value that gets one beat.
///
/// Ambient playback always runs in 4/4; the type exists so the bar length and
/// the MIDI time-signature meta event are derived from one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Number of beats per bar (numerator)
    pub numerator: u8,
    /// Note value that gets one beat (denominator: 4 = quarter, 8 = eighth)
    pub denominator: u8,
}

impl TimeSignature {
    /// Standard 4/4 time
    pub const FOUR_FOUR: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    pub const fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// One bar as a duration: numerator beats of 1/denominator each.
    pub fn bar(&self) -> Duration {
        Duration {
            numerator: self.numerator as u32,
            denominator: self.denominator as u32,
        }
        .reduce()
    }

    /// Length of one bar in seconds. The beat is the denominator's note value,
    /// and `bpm` counts those beats.
    pub fn bar_seconds(&self, bpm: f64) -> f64 {
        self.numerator as f64 * (60.0 / bpm)
    }

    /// Denominator as the power of two the MIDI time-signature event stores.
    pub fn denominator_power(&self) -> u8 {
        self.denominator.max(1).trailing_zeros() as u8
    }
}
