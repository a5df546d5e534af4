use rand::Rng;

use crate::sequencing::{Duration, Tempo};

/*
Note Scheduling
===============

Onsets form a Poisson process with rate

    λ = mean_notes_per_bar / bar_seconds

so the gap to the next note is exponential: `-ln(1 - u) / λ` for a uniform
`u` in [0, 1), floored at 10 ms. The raw arrival time is then pushed *up* to
the next sixteenth-note grid line, so timing stays random but every note
lands on the grid.

  u = 0.5, λ = 1   gap 0.693 s   →   grid 0.25 s   →   onset 0.75 s

Chord changes run on their own clock: one hop every four bars.

Lookahead
---------

The host calls `tick(now)` roughly every 50 ms. Anything due within the next
200 ms is committed to the backend now, at its exact time, so jitter in the
host loop never reaches the audio.

        now                now + 0.2
  ───────┼────────────────────┼───────────→ t
         │  ◆   ◆      ◆      │  ◆
         └── committed ───────┘  next tick
*/

pub const LOOKAHEAD_SECONDS: f64 = 0.2;
pub const TICK_PERIOD_SECONDS: f64 = 0.05;
pub const MAX_TRIGGERS_PER_TICK: usize = 3;
/// A note is never scheduled closer than this to `now`.
pub const MIN_TRIGGER_LEAD_SECONDS: f64 = 0.02;
/// Delay before the first note after start.
pub const START_DELAY_SECONDS: f64 = 0.1;
pub const MIN_INTER_ARRIVAL_SECONDS: f64 = 0.01;
pub const BARS_PER_CHANGE: f64 = 4.0;

/// Round `time` up to the next multiple of a sixteenth note at `bpm`.
pub fn quantize_to_sixteenth(time: f64, bpm: f64) -> f64 {
    let grid = Duration::SIXTEENTH.to_seconds(bpm);
    let mut steps = (time / grid).ceil().max(0.0);
    if steps * grid < time {
        steps += 1.0;
    }
    steps * grid
}

/// Exponential inter-arrival time for the uniform draw `u` at `rate` notes per second.
pub fn inter_arrival(u: f64, rate: f64) -> f64 {
    let u = u.clamp(0.0, 1.0 - f64::EPSILON);
    (-(1.0 - u).ln() / rate).max(MIN_INTER_ARRIVAL_SECONDS)
}

/// The onset following one at `from`, for the uniform draw `u`.
pub fn next_onset(from: f64, u: f64, tempo: &Tempo) -> f64 {
    quantize_to_sixteenth(from + inter_arrival(u, tempo.note_rate()), tempo.bpm)
}

/// Timing state of a running engine: when the next note and the next chord
/// change are due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteScheduler {
    next_note: f64,
    next_hop: f64,
}

impl NoteScheduler {
    /// First note 100 ms after `now`, first chord change four bars later.
    pub fn start(now: f64, tempo: &Tempo) -> Self {
        Self {
            next_note: now + START_DELAY_SECONDS,
            next_hop: now + hop_seconds(tempo),
        }
    }

    pub fn next_note_time(&self) -> f64 {
        self.next_note
    }

    pub fn next_hop_time(&self) -> f64 {
        self.next_hop
    }

    pub fn hop_due(&self, now: f64) -> bool {
        now >= self.next_hop - LOOKAHEAD_SECONDS
    }

    pub fn advance_hop(&mut self, tempo: &Tempo) {
        self.next_hop += hop_seconds(tempo);
    }

    pub fn note_due(&self, now: f64) -> bool {
        self.next_note < now + LOOKAHEAD_SECONDS
    }

    /// When the due note should actually sound.
    ///
    /// A note whose onset has already passed (the host stalled) sounds at
    /// `now + MIN_TRIGGER_LEAD_SECONDS`, but the next onset is still drawn
    /// from the late one. A backlog therefore plays out as bursts of at most
    /// `MAX_TRIGGERS_PER_TICK` notes at the lead time until the clock is
    /// caught up.
    pub fn trigger_time(&self, now: f64) -> f64 {
        self.next_note.max(now + MIN_TRIGGER_LEAD_SECONDS)
    }

    pub fn advance_note(&mut self, u: f64, tempo: &Tempo) {
        self.next_note = next_onset(self.next_note, u, tempo);
    }

    pub fn advance_note_with<R: Rng + ?Sized>(&mut self, tempo: &Tempo, rng: &mut R) {
        self.advance_note(rng.gen::<f64>(), tempo);
    }
}

/// Time between chord changes.
pub fn hop_seconds(tempo: &Tempo) -> f64 {
    tempo.bar_seconds() * BARS_PER_CHANGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn on_grid(time: f64, grid: f64) -> bool {
        let steps = time / grid;
        (steps - steps.round()).abs() < 1e-9
    }

    #[test]
    fn quantize_rounds_up_onto_the_grid() {
        for bpm in [45.0, 60.0, 91.0, 140.0] {
            let grid = 60.0 / bpm / 4.0;
            let mut t = -0.3;
            while t < 12.0 {
                let q = quantize_to_sixteenth(t, bpm);
                assert!(q >= t, "{q} < {t}");
                assert!(q >= 0.0);
                assert!(q - t < grid + 1e-9);
                assert!(on_grid(q, grid), "{q} is off the {grid} grid");
                t += 0.0137;
            }
        }
        assert_eq!(quantize_to_sixteenth(0.75, 60.0), 0.75);
    }

    #[test]
    fn first_gap_scenario() {
        let tempo = Tempo::new(60.0, 4.0);
        assert!((inter_arrival(0.5, tempo.note_rate()) - 0.693_147).abs() < 1e-5);
        assert_eq!(next_onset(0.0, 0.5, &tempo), 0.75);
        // u = 0.3: gap 0.357 from 0.75 lands on 1.25
        assert_eq!(next_onset(0.75, 0.3, &tempo), 1.25);
    }

    #[test]
    fn gap_is_floored() {
        assert_eq!(inter_arrival(0.0, 1_000.0), MIN_INTER_ARRIVAL_SECONDS);
        assert!(inter_arrival(0.999_999_999, 1.0).is_finite());
    }

    #[test]
    fn onsets_never_go_backwards_and_stay_on_grid() {
        let mut rng = StdRng::seed_from_u64(21);
        for (bpm, density) in [(60.0, 4.0), (133.0, 0.5), (20.0, 40.0), (300.0, 16.0)] {
            let tempo = Tempo::new(bpm, density);
            let grid = tempo.sixteenth_seconds();
            let mut scheduler = NoteScheduler::start(0.0, &tempo);
            let mut previous = scheduler.next_note_time();
            for _ in 0..500 {
                scheduler.advance_note_with(&tempo, &mut rng);
                let next = scheduler.next_note_time();
                assert!(next > previous, "{next} after {previous}");
                assert!(on_grid(next, grid));
                previous = next;
            }
        }
    }

    #[test]
    fn lookahead_windows() {
        let tempo = Tempo::new(60.0, 4.0);
        let scheduler = NoteScheduler::start(10.0, &tempo);
        assert!((scheduler.next_note_time() - 10.1).abs() < 1e-12);
        assert_eq!(scheduler.next_hop_time(), 26.0);

        assert!(scheduler.note_due(10.0));
        assert!((scheduler.trigger_time(10.0) - 10.1).abs() < 1e-12);
        assert!((scheduler.trigger_time(10.095) - 10.115).abs() < 1e-12);

        assert!(!scheduler.hop_due(25.7));
        assert!(scheduler.hop_due(25.81));
    }

    #[test]
    fn stalled_host_plays_the_backlog_at_the_lead_time() {
        let tempo = Tempo::new(60.0, 4.0);
        let mut scheduler = NoteScheduler::start(0.0, &tempo);
        let now = 5.0;

        let mut triggered = Vec::new();
        while scheduler.note_due(now) && triggered.len() < MAX_TRIGGERS_PER_TICK {
            triggered.push(scheduler.trigger_time(now));
            scheduler.advance_note(0.5, &tempo);
        }

        assert_eq!(triggered, vec![now + MIN_TRIGGER_LEAD_SECONDS; 3]);
        assert!(scheduler.next_note_time() < now, "backlog still pending");
        assert!(scheduler.note_due(now + TICK_PERIOD_SECONDS));
    }
}
