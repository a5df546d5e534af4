//! Error types for each failure domain.

use thiserror::Error;

/// The relation-graph dataset could not be loaded.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node {index} is {value:?}, expected 12 characters of '0'/'1'")]
    InvalidNode { index: usize, value: String },

    #[error("adjacency has {adjacency} entries but there are {nodes} nodes")]
    AdjacencyLength { nodes: usize, adjacency: usize },
}

/// The playback backend could not be acquired or driven.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no default output device available")]
    NoDevice,

    #[error("failed to query output config: {0}")]
    Config(String),

    #[error("failed to build output stream: {0}")]
    BuildStream(String),

    #[error("failed to control output stream: {0}")]
    Stream(String),

    #[error("command queue is full")]
    QueueFull,
}

/// The reverb impulse response could not be synthesized.
#[derive(Debug, Error, PartialEq)]
pub enum ReverbError {
    #[error("sample rate {0} is not a positive finite number")]
    InvalidSampleRate(f32),

    #[error("impulse response would be empty")]
    EmptyImpulse,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// `start()` could not obtain or resume the playback clock.
    #[error("playback backend unavailable: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("MIDI encoding failed: {0}")]
    Midi(String),

    #[error("offline render failed: {0}")]
    Render(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
