use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/*
| type      | passes          | rejects         |
| --------- | --------------- | --------------- |
| low-pass  | below cutoff    | above cutoff    |
| band-pass | around cutoff   | both sides      |
| high-pass | above cutoff    | below cutoff    |

One stage is a second-order state-variable filter (TPT form), i.e. a biquad.
Resonance is expressed as Q: the damping term is k = 1 / Q, so Q = 0.707 is
the flat Butterworth response and larger values add a peak at the cutoff.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    LowPass,
    BandPass,
    HighPass,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

pub const MIN_Q: f32 = 0.1;
pub const MAX_Q: f32 = 20.0;

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub q: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, q: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            q: q.clamp(MIN_Q, MAX_Q),
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, std::f32::consts::FRAC_1_SQRT_2)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz, std::f32::consts::FRAC_1_SQRT_2)
    }

    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::BandPass, cutoff_hz, std::f32::consts::FRAC_1_SQRT_2)
    }

    /// Prewarped integrator gain `g` and damping `k` for the current settings.
    #[inline]
    pub fn coefficients(&self, sample_rate: f32) -> (f32, f32) {
        let cutoff = self.cutoff_hz.clamp(1.0, sample_rate * 0.49);
        let g = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / self.q;
        (g, k)
    }

    pub fn next_sample(&mut self, sample: f32, g: f32, k: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
        }
    }

    /// Filter one sample with precomputed coefficients, returning the
    /// response selected by the filter type.
    #[inline]
    pub fn process(&mut self, sample: f32, g: f32, k: f32) -> f32 {
        let outputs = self.next_sample(sample, g, k);
        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::BandPass => outputs.bandpass,
            FilterType::HighPass => outputs.highpass,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let (g, k) = self.coefficients(sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, g, k);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q.clamp(MIN_Q, MAX_Q);
    }
}
