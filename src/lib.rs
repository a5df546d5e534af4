pub mod backend; // Command protocol between the engine and a render target
pub mod config;
pub mod dsp;
pub mod engine; // Scheduling, voice pool, live and offline orchestration
pub mod error;
pub mod graph; // Render nodes built on the dsp primitives
pub mod harmony; // Pitch-class sets and the relation graph walker
pub mod io;
pub mod patch;
pub mod sequencing; // Musical timing
pub mod synth; // Per-note voices

pub use config::EngineConfig;
pub use engine::{ControlHandle, Engine, EngineObserver, PlayState};
pub use error::{BackendError, ConfigError, DatasetError, EncodeError, EngineError, ReverbError};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
