use crate::{
    dsp::oscillator::OscillatorBlock,
    graph::node::{GraphNode, RenderCtx},
};

/*
LFO (Low Frequency Oscillator)
==============================

A sine oscillator at its own fixed, sub-audio rate. Each voice owns two:

  Vibrato:    LFO → carrier frequency (depth as a fraction of f0)
  Tremolo:    LFO → amplitude (gain between 1 - depth and 1)

Both start at phase zero on the note's first sample, so every note gets the
same modulation shape relative to its onset.

See `dsp/lfo.rs` for the vibrato and tremolo formulas.
*/

pub struct LfoNode {
    osc: OscillatorBlock,
    rate_hz: f32,
}

impl LfoNode {
    pub fn sine(rate_hz: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(),
            rate_hz: rate_hz.max(0.0),
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate_hz
    }

    /// One bipolar sample (-1.0 to +1.0).
    #[inline]
    pub fn next_value(&mut self, sample_rate: f32) -> f32 {
        self.osc.next_sample(self.rate_hz, sample_rate)
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.osc.render(out, self.rate_hz, ctx.sample_rate);
    }
}
