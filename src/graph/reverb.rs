use crate::dsp::reverb::{ImpulseResponse, PartitionedConvolver};

/*
Convolution Reverb Node
=======================

Mono in, stereo out. The same input feeds a left and a right convolver whose
impulses differ only in their noise, which decorrelates the two tails and
makes the space sound wide.

  input ──┬──(× 0.7)──────────────────┬──→ left  = dry + wet_l
          │                           └──→ right = dry + wet_r
          ├──[ convolve left IR  ]──(× 0.3)──→ wet_l
          └──[ convolve right IR ]──(× 0.3)──→ wet_r

The wet path lags by one convolution partition (see `dsp/reverb.rs`).
*/

pub const DRY_GAIN: f32 = 0.7;
pub const WET_GAIN: f32 = 0.3;

pub struct ConvolutionReverb {
    left: PartitionedConvolver,
    right: PartitionedConvolver,
    tail_seconds: f32,
}

impl ConvolutionReverb {
    pub fn new(impulse: &ImpulseResponse) -> Self {
        Self {
            left: PartitionedConvolver::new(&impulse.left),
            right: PartitionedConvolver::new(&impulse.right),
            tail_seconds: impulse.duration_seconds(),
        }
    }

    /// Length of the impulse, i.e. how long the reverb rings after input stops.
    pub fn tail_seconds(&self) -> f32 {
        self.tail_seconds
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let dry = input * DRY_GAIN;
        let wet_l = self.left.process(input) * WET_GAIN;
        let wet_r = self.right.process(input) * WET_GAIN;
        (dry + wet_l, dry + wet_r)
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::reverb::PARTITION;

    #[test]
    fn dry_and_wet_weights() {
        let impulse = ImpulseResponse::from_channels(vec![1.0], vec![-1.0], 1_000.0).unwrap();
        let mut reverb = ConvolutionReverb::new(&impulse);

        let (l0, r0) = reverb.process(1.0);
        assert!((l0 - DRY_GAIN).abs() < 1e-6);
        assert!((r0 - DRY_GAIN).abs() < 1e-6);

        let mut wet = (0.0, 0.0);
        for _ in 1..=PARTITION {
            wet = reverb.process(0.0);
        }
        assert!((wet.0 - WET_GAIN).abs() < 1e-4, "left wet {:?}", wet);
        assert!((wet.1 + WET_GAIN).abs() < 1e-4, "right wet {:?}", wet);
    }
}
