use tracing::debug;

use crate::{
    dsp::reverb::ImpulseResponse,
    graph::{delay::FeedbackDelay, reverb::ConvolutionReverb},
    patch::EffectSettings,
};

/*
Effects Chain
=============

  voices ─→ [ feedback delay ] ─→ [ convolution reverb ] ─→ left / right
             dry (1-mix) + wet mix    dry 0.7 + wet 0.3

Without a reverb (impulse synthesis failed) the delay output goes to both
channels at unity gain.
*/

pub struct EffectsChain {
    delay: FeedbackDelay,
    reverb: Option<ConvolutionReverb>,
}

impl EffectsChain {
    pub fn new(settings: &EffectSettings, impulse: Option<&ImpulseResponse>, sample_rate: f32) -> Self {
        debug!(
            reverb = impulse.is_some(),
            stages = settings.filter_order.stages(),
            "building effects chain"
        );
        Self {
            delay: FeedbackDelay::new(settings, sample_rate),
            reverb: impulse.map(ConvolutionReverb::new),
        }
    }

    pub fn configure(&mut self, settings: &EffectSettings) {
        self.delay.configure(settings);
    }

    pub fn delay(&self) -> &FeedbackDelay {
        &self.delay
    }

    pub fn has_reverb(&self) -> bool {
        self.reverb.is_some()
    }

    /// Process a mono block into the two output channels.
    pub fn render(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            let delayed = self.delay.process(x);
            let (out_l, out_r) = match self.reverb.as_mut() {
                Some(reverb) => reverb.process(delayed),
                None => (delayed, delayed),
            };
            *l = out_l;
            *r = out_r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_reverb_output_is_delay_output_on_both_channels() {
        let mut settings = EffectSettings::default();
        settings.delay_enabled = false;
        let mut chain = EffectsChain::new(&settings, None, 8_000.0);
        assert!(!chain.has_reverb());

        let input = [0.25f32, -0.5, 0.0, 1.0];
        let mut left = [0.0f32; 4];
        let mut right = [0.0f32; 4];
        chain.render(&input, &mut left, &mut right);
        assert_eq!(left, input);
        assert_eq!(right, input);
    }

    #[test]
    fn reverb_scales_dry_path() {
        let mut settings = EffectSettings::default();
        settings.delay_enabled = false;
        let impulse = ImpulseResponse::from_channels(vec![0.0, 1.0], vec![0.0, 1.0], 8_000.0).unwrap();
        let mut chain = EffectsChain::new(&settings, Some(&impulse), 8_000.0);

        let mut left = [0.0f32; 1];
        let mut right = [0.0f32; 1];
        chain.render(&[1.0], &mut left, &mut right);
        assert!((left[0] - 0.7).abs() < 1e-6);
        assert!((right[0] - 0.7).abs() < 1e-6);
    }
}
