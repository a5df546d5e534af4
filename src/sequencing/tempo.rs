use serde::{Deserialize, Serialize};

use crate::sequencing::{Duration, TimeSignature};

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;

/// Tempo and note density, the two transport values the control surface sets
/// independently of the synth parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tempo {
    /// Quarter-note beats per minute
    pub bpm: f64,
    /// Expected number of note onsets per 4/4 bar
    pub mean_notes_per_bar: f64,
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: 60.0,
            mean_notes_per_bar: 4.0,
        }
    }
}

impl Tempo {
    /// Build a tempo with both values pulled into their usable ranges.
    pub fn new(bpm: f64, mean_notes_per_bar: f64) -> Self {
        Self {
            bpm,
            mean_notes_per_bar,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        let bpm = if self.bpm.is_finite() {
            self.bpm.clamp(MIN_BPM, MAX_BPM)
        } else {
            Tempo::default().bpm
        };
        let mean_notes_per_bar = if self.mean_notes_per_bar.is_finite() {
            self.mean_notes_per_bar.max(0.01)
        } else {
            Tempo::default().mean_notes_per_bar
        };
        Self {
            bpm,
            mean_notes_per_bar,
        }
    }

    /// Seconds per 4/4 bar: `4 * (60 / bpm)`.
    pub fn bar_seconds(&self) -> f64 {
        TimeSignature::FOUR_FOUR.bar_seconds(self.bpm)
    }

    /// Grid spacing for onset quantization: `(60 / bpm) / 4`.
    pub fn sixteenth_seconds(&self) -> f64 {
        Duration::SIXTEENTH.to_seconds(self.bpm)
    }

    /// Poisson onset rate `lambda = mean_notes_per_bar / bar_seconds`, in notes per second.
    pub fn note_rate(&self) -> f64 {
        self.mean_notes_per_bar / self.bar_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_bpm_four_notes_per_bar() {
        let tempo = Tempo::new(60.0, 4.0);
        assert!((tempo.bar_seconds() - 4.0).abs() < 1e-12);
        assert!((tempo.note_rate() - 1.0).abs() < 1e-12);
        assert!((tempo.sixteenth_seconds() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let tempo = Tempo::new(5000.0, -3.0);
        assert_eq!(tempo.bpm, MAX_BPM);
        assert!(tempo.mean_notes_per_bar > 0.0);

        let tempo = Tempo::new(f64::NAN, f64::INFINITY);
        assert_eq!(tempo, Tempo::default());
    }
}
