//! Engine configuration loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    engine::offline::{Exporter, DEFAULT_SAMPLE_RATE},
    error::ConfigError,
    harmony::GraphData,
    patch::SynthParams,
    sequencing::Tempo,
};

/// Everything needed to start playback or run an export.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bpm: f64,
    pub mean_notes_per_bar: f64,
    /// Export length in 8-bar blocks
    pub hyperbars: u32,
    /// Offline render rate; live playback uses the device rate
    pub sample_rate: u32,
    /// Fixed seed; entropy when absent
    pub seed: Option<u64>,
    /// Relation-graph dataset (JSON); the built-in triad graph when absent
    pub graph: Option<PathBuf>,
    pub params: SynthParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let tempo = Tempo::default();
        Self {
            bpm: tempo.bpm,
            mean_notes_per_bar: tempo.mean_notes_per_bar,
            hyperbars: 4,
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: None,
            graph: None,
            params: SynthParams::default(),
        }
    }
}

impl EngineConfig {
    /// Read a config file. A relative `graph` path is taken relative to the
    /// file's own directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let (Some(graph), Some(dir)) = (config.graph.as_mut(), path.parent()) {
            if graph.is_relative() {
                *graph = dir.join(&*graph);
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn tempo(&self) -> Tempo {
        Tempo::new(self.bpm, self.mean_notes_per_bar)
    }

    pub fn params(&self) -> SynthParams {
        self.params.clamped()
    }

    pub fn graph_data(&self) -> Result<Arc<GraphData>, ConfigError> {
        let data = match &self.graph {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                GraphData::from_json(&json)?
            }
            None => GraphData::builtin(),
        };
        Ok(Arc::new(data))
    }

    /// The configured seed, or a fresh one from entropy.
    pub fn seed_or_random(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn exporter(&self, seed: u64) -> Result<Exporter, ConfigError> {
        Ok(
            Exporter::new(self.graph_data()?, self.params(), self.tempo(), seed)
                .with_sample_rate(self.sample_rate),
        )
    }
}
