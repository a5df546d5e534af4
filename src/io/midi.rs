//! Standard MIDI File export (format 0, one track).
//!
//! Seconds become ticks through `ticks_per_second = 480 * bpm / 60`. Events
//! are sorted by tick, note-offs before note-ons on the same tick, and each
//! carries the delta from the one before it.

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::{engine::offline::NoteEvent, error::EncodeError, sequencing::TimeSignature};

/// Ticks per quarter note.
pub const PPQ: u16 = 480;
pub const CHANNEL: u8 = 0;
pub const VELOCITY: u8 = 80;

/// A note boundary at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TickEvent {
    pub tick: u32,
    /// `false` sorts first, so offs precede ons on the same tick
    pub on: bool,
    pub key: u8,
}

pub fn ticks_per_second(bpm: f64) -> f64 {
    PPQ as f64 * bpm / 60.0
}

/// On/off tick pairs for every note, sorted for writing.
pub fn note_ticks(notes: &[NoteEvent], bpm: f64) -> Vec<TickEvent> {
    let tps = ticks_per_second(bpm);
    let mut events: Vec<TickEvent> = notes
        .iter()
        .flat_map(|note| {
            let key = note.midi_note.min(127);
            let on = (note.start_time.max(0.0) * tps).round() as u32;
            let off = ((note.start_time + note.duration).max(0.0) * tps).round() as u32;
            [
                TickEvent { tick: on, on: true, key },
                TickEvent {
                    tick: off.max(on + 1),
                    on: false,
                    key,
                },
            ]
        })
        .collect();
    events.sort();
    events
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

pub fn encode_midi(notes: &[NoteEvent], bpm: f64) -> Result<Vec<u8>, EncodeError> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(PPQ)),
    ));

    let mut track: Track<'static> = Vec::new();
    let tempo_microseconds = (60_000_000.0 / bpm).round() as u32;
    track.push(meta(0, MetaMessage::Tempo(u24::new(tempo_microseconds))));
    // 24 clocks per click, 8 thirty-seconds per quarter
    let meter = TimeSignature::FOUR_FOUR;
    track.push(meta(
        0,
        MetaMessage::TimeSignature(meter.numerator, meter.denominator_power(), 24, 8),
    ));

    let mut previous = 0u32;
    for event in note_ticks(notes, bpm) {
        let key = u7::new(event.key);
        let message = if event.on {
            MidiMessage::NoteOn {
                key,
                vel: u7::new(VELOCITY),
            }
        } else {
            MidiMessage::NoteOff {
                key,
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(event.tick - previous),
            kind: TrackEventKind::Midi {
                channel: u4::new(CHANNEL),
                message,
            },
        });
        previous = event.tick;
    }
    track.push(meta(0, MetaMessage::EndOfTrack));
    smf.tracks.push(track);

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|err| EncodeError::Midi(err.to_string()))?;
    Ok(bytes)
}
