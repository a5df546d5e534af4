// Purpose - export encoders: rendered audio to WAV, note lists to MIDI

pub mod midi;
pub mod wav;

pub use midi::{encode_midi, note_ticks, TickEvent};
pub use wav::encode_wav;
