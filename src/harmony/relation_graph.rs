use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::DatasetError, harmony::PitchClassSet};

/// The 24 major and minor triads, each linked to its P, L and R neighbours.
const BUILTIN_DATASET: &str = include_str!("../../assets/triads.json");

/// On-disk record shape of a relation graph.
///
/// `nodes[i]` is a 12-character binary string (character `j` set when pitch
/// class `j` is present) and `adjacency[i]` lists the neighbours of node `i`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDataset {
    pub nodes: Vec<String>,
    pub adjacency: Vec<Vec<usize>>,
}

/// Parsed, immutable graph shared between walkers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphData {
    nodes: Vec<PitchClassSet>,
    adjacency: Vec<Vec<usize>>,
}

impl GraphData {
    /// Parse a dataset record. Connectivity and symmetry are not checked;
    /// neighbour indices that point past the node list are dropped.
    pub fn from_dataset(dataset: &GraphDataset) -> Result<Self, DatasetError> {
        if dataset.adjacency.len() != dataset.nodes.len() {
            return Err(DatasetError::AdjacencyLength {
                nodes: dataset.nodes.len(),
                adjacency: dataset.adjacency.len(),
            });
        }

        let nodes = dataset
            .nodes
            .iter()
            .enumerate()
            .map(|(index, value)| {
                PitchClassSet::from_binary_str(value).ok_or_else(|| DatasetError::InvalidNode {
                    index,
                    value: value.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = nodes.len();
        let adjacency = dataset
            .adjacency
            .iter()
            .enumerate()
            .map(|(index, neighbours)| {
                let kept: Vec<usize> = neighbours.iter().copied().filter(|&n| n < count).collect();
                if kept.len() != neighbours.len() {
                    warn!(
                        node = index,
                        dropped = neighbours.len() - kept.len(),
                        "dropping out-of-range neighbours"
                    );
                }
                kept
            })
            .collect();

        Ok(Self { nodes, adjacency })
    }

    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let dataset: GraphDataset = serde_json::from_str(json)?;
        Self::from_dataset(&dataset)
    }

    /// The embedded triad graph. Falls back to an empty graph, which the walker
    /// tolerates, if the embedded asset ever fails to parse.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_DATASET).unwrap_or_else(|err| {
            warn!("built-in relation graph is invalid: {err}");
            Self::default()
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<PitchClassSet> {
        self.nodes.get(index).copied()
    }

    pub fn neighbours(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A random walker over a shared [`GraphData`].
///
/// The cursor is the only mutable state. Cloning the `Arc` and building a new
/// walker gives an independent walk over the same data.
#[derive(Debug, Clone)]
pub struct RelationGraph {
    data: Arc<GraphData>,
    current: usize,
}

impl RelationGraph {
    /// Start a walk at a uniformly random node.
    pub fn new<R: Rng + ?Sized>(data: Arc<GraphData>, rng: &mut R) -> Self {
        let current = if data.is_empty() {
            0
        } else {
            rng.gen_range(0..data.len())
        };
        Self { data, current }
    }

    /// Start a walk at a given node (clamped into range).
    pub fn starting_at(data: Arc<GraphData>, index: usize) -> Self {
        let current = index.min(data.len().saturating_sub(1));
        Self { data, current }
    }

    pub fn data(&self) -> &Arc<GraphData> {
        &self.data
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The set under the cursor; empty when the graph has no nodes.
    pub fn current(&self) -> PitchClassSet {
        self.data.node(self.current).unwrap_or(PitchClassSet::EMPTY)
    }

    /// Step to a uniformly random neighbour, or restart at a uniformly random
    /// node when the current node has none.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.data.is_empty() {
            return;
        }
        self.current = match self.data.neighbours(self.current).choose(rng) {
            Some(&next) => next,
            None => rng.gen_range(0..self.data.len()),
        };
    }
}
