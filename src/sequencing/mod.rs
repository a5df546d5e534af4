pub mod duration;
pub mod tempo;
pub mod time_signature;

pub use duration::{Duration, ParseDurationError};
pub use tempo::Tempo;
pub use time_signature::TimeSignature;
