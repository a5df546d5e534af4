use crate::{
    backend::{AudioGraph, GraphCommand, SignalChain},
    error::BackendError,
};

/// Deterministic backend that renders into memory.
///
/// Commands are applied as soon as they are sent and the clock only moves
/// when [`OfflineGraph::render`] is called, so a run is a pure function of
/// the commands and render calls made against it.
pub struct OfflineGraph {
    chain: SignalChain,
    resumed: bool,
}

/// Two equally long channels of rendered audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoBuffer {
    pub fn with_len(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn truncate(&mut self, frames: usize) {
        self.left.truncate(frames);
        self.right.truncate(frames);
    }

    /// Left/right sample pairs.
    pub fn interleaved(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.left.iter().copied().zip(self.right.iter().copied())
    }
}

impl OfflineGraph {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            chain: SignalChain::new(sample_rate, 64),
            resumed: false,
        }
    }

    pub fn chain(&self) -> &SignalChain {
        &self.chain
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// Render the next `frames` frames and advance the clock.
    pub fn render(&mut self, frames: usize) -> StereoBuffer {
        let mut buffer = StereoBuffer::with_len(frames);
        self.render_into(&mut buffer);
        buffer
    }

    pub fn render_into(&mut self, buffer: &mut StereoBuffer) {
        self.chain.render(&mut buffer.left, &mut buffer.right);
        self.chain.prune_finished();
    }

    /// Render until the clock reaches `time`, discarding the audio.
    pub fn advance_to(&mut self, time: f64) {
        let target = (time * self.chain.sample_rate() as f64).ceil().max(0.0) as u64;
        let frames = target.saturating_sub(self.chain.frames()) as usize;
        if frames > 0 {
            self.render(frames);
        }
    }
}

impl AudioGraph for OfflineGraph {
    fn resume(&mut self) -> Result<(), BackendError> {
        self.resumed = true;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), BackendError> {
        self.resumed = false;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.chain.time()
    }

    fn sample_rate(&self) -> f32 {
        self.chain.sample_rate()
    }

    fn send(&mut self, command: GraphCommand) -> Result<(), BackendError> {
        self.chain.apply(command);
        Ok(())
    }
}
