// Per-note synthesis: the voice that the engine schedules and the backend renders

pub mod voice;

pub use voice::{Voice, VoiceSpec, VoiceState};
