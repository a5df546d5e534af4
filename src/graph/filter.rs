use crate::{
    dsp::{
        filter::{FilterType, SVFilter},
        smoothing::Smoothed,
    },
    graph::node::{GraphNode, RenderCtx},
    patch::FilterOrder,
};

/*
Filter Cascade
==============

The feedback delay colours its repeats with a chain of identical biquad
stages. One stage gives the basic slope of its response; each extra stage
steepens it.

  order (dB/oct)   stages
  6                1
  12               2
  24               4

Reconfiguring
-------------

  type / cutoff / Q changed   every existing stage is updated in place;
                              cutoff and Q glide over the smoothing ramp
  order changed               the stages are thrown away and rebuilt from
                              scratch with fresh state, and the generation
                              counter moves on

Stage storage is reserved for the largest order up front, so a rebuild
never allocates.
*/

const MAX_STAGES: usize = 4;

pub struct FilterCascade {
    stages: Vec<SVFilter>,
    order: FilterOrder,
    filter_type: FilterType,
    cutoff: Smoothed,
    q: Smoothed,
    generation: u64,
    coefficients: Option<(f32, f32, f32, f32)>, // (cutoff, q, g, k)
}

impl FilterCascade {
    pub fn new(order: FilterOrder, filter_type: FilterType, cutoff_hz: f32, q: f32) -> Self {
        let mut cascade = Self {
            stages: Vec::with_capacity(MAX_STAGES),
            order,
            filter_type,
            cutoff: Smoothed::new(cutoff_hz),
            q: Smoothed::new(q),
            generation: 0,
            coefficients: None,
        };
        cascade.build_stages();
        cascade
    }

    fn build_stages(&mut self) {
        self.stages.clear();
        for _ in 0..self.order.stages() {
            self.stages.push(SVFilter::new(
                self.filter_type,
                self.cutoff.value(),
                self.q.value(),
            ));
        }
    }

    /// Apply new settings, rebuilding only when the order changed.
    pub fn configure(
        &mut self,
        order: FilterOrder,
        filter_type: FilterType,
        cutoff_hz: f32,
        q: f32,
        ramp_samples: u32,
    ) {
        self.cutoff.set_target(cutoff_hz, ramp_samples);
        self.q.set_target(q, ramp_samples);
        self.filter_type = filter_type;

        if order != self.order {
            self.order = order;
            self.generation += 1;
            self.build_stages();
        } else {
            for stage in self.stages.iter_mut() {
                stage.set_filter_type(filter_type);
            }
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Bumped on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn order(&self) -> FilterOrder {
        self.order
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    #[inline]
    pub fn process(&mut self, sample: f32, sample_rate: f32) -> f32 {
        let cutoff = self.cutoff.next_value();
        let q = self.q.next_value();

        let (g, k) = match self.coefficients {
            Some((c, r, g, k)) if c == cutoff && r == q => (g, k),
            _ => {
                for stage in self.stages.iter_mut() {
                    stage.set_cutoff(cutoff);
                    stage.set_q(q);
                }
                let (g, k) = match self.stages.first() {
                    Some(stage) => stage.coefficients(sample_rate),
                    None => (0.0, 1.0),
                };
                self.coefficients = Some((cutoff, q, g, k));
                (g, k)
            }
        };

        self.stages
            .iter_mut()
            .fold(sample, |signal, stage| stage.process(signal, g, k))
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

impl GraphNode for FilterCascade {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.process(*sample, ctx.sample_rate);
        }
    }
}
