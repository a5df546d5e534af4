use crate::{
    dsp::{
        delay::DelayLine,
        smoothing::{ramp_samples, Smoothed},
    },
    graph::{
        filter::FilterCascade,
        node::{GraphNode, RenderCtx},
    },
    patch::{EffectSettings, MAX_DELAY_SECONDS, MAX_FEEDBACK},
};

/*
Filtered Feedback Delay
=======================

  input ──┬───────────────────────────────(× 1 - mix)──┐
          │                                            (+)──→ output
          └─→(+)─→[ delay line ]─→[ filter cascade ]─┬─(× mix)
              ↑                                      │
              └──────────────(× feedback)────────────┘

Every repeat passes through the cascade once more, so with a low-pass the
echoes grow darker as they fade. Feedback is capped at 0.95 so the loop
always decays.

Delay time, feedback, mix, cutoff and Q all glide to new values over a short
linear ramp. The line holds the longest delay a patch can ask for, a
dotted whole note at the slowest tempo. Switching the delay off glides `mix` to zero: the loop keeps
running silently and its tail is simply not heard.
*/

/// Length of every parameter glide.
pub const SMOOTHING_SECONDS: f32 = 0.05;

pub struct FeedbackDelay {
    line: DelayLine,
    cascade: FilterCascade,
    delay_samples: Smoothed,
    feedback: Smoothed,
    mix: Smoothed,
    enabled: bool,
    sample_rate: f32,
}

impl FeedbackDelay {
    pub fn new(settings: &EffectSettings, sample_rate: f32) -> Self {
        let mix = if settings.delay_enabled { settings.mix } else { 0.0 };
        Self {
            line: DelayLine::with_max_seconds(MAX_DELAY_SECONDS + SMOOTHING_SECONDS, sample_rate),
            cascade: FilterCascade::new(
                settings.filter_order,
                settings.filter_type,
                settings.filter_frequency,
                settings.filter_q,
            ),
            delay_samples: Smoothed::new(settings.delay_seconds * sample_rate),
            feedback: Smoothed::new(settings.feedback.clamp(0.0, MAX_FEEDBACK)),
            mix: Smoothed::new(mix),
            enabled: settings.delay_enabled,
            sample_rate,
        }
    }

    /// Glide towards `settings`.
    pub fn configure(&mut self, settings: &EffectSettings) {
        let ramp = ramp_samples(SMOOTHING_SECONDS, self.sample_rate);
        let mix = if settings.delay_enabled { settings.mix } else { 0.0 };

        self.enabled = settings.delay_enabled;
        self.delay_samples
            .set_target(settings.delay_seconds * self.sample_rate, ramp);
        self.feedback
            .set_target(settings.feedback.clamp(0.0, MAX_FEEDBACK), ramp);
        self.mix.set_target(mix, ramp);
        self.cascade.configure(
            settings.filter_order,
            settings.filter_type,
            settings.filter_frequency,
            settings.filter_q,
            ramp,
        );
    }

    pub fn cascade(&self) -> &FilterCascade {
        &self.cascade
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delay = self.delay_samples.next_value();
        let feedback = self.feedback.next_value();
        let mix = self.mix.next_value();

        let delayed = self.line.read_interpolated(delay);
        let wet = self.cascade.process(delayed, self.sample_rate);
        self.line.write(input + wet * feedback);

        input * (1.0 - mix) + wet * mix
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.cascade.reset();
    }
}

impl GraphNode for FeedbackDelay {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::filter::FilterType;
    use crate::patch::FilterOrder;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn settings() -> EffectSettings {
        EffectSettings {
            delay_enabled: true,
            delay_seconds: 0.1,
            feedback: 0.5,
            mix: 0.5,
            filter_type: FilterType::LowPass,
            filter_frequency: 490.0,
            filter_q: std::f32::consts::FRAC_1_SQRT_2,
            filter_order: FilterOrder::Six,
        }
    }

    fn impulse_response(delay: &mut FeedbackDelay, len: usize) -> Vec<f32> {
        let mut block = vec![0.0f32; len];
        block[0] = 1.0;
        delay.render_block(&mut block, &RenderCtx::new(SAMPLE_RATE, 0.0));
        block
    }

    #[test]
    fn repeats_decay_by_feedback() {
        let mut delay = FeedbackDelay::new(&settings(), SAMPLE_RATE);
        let out = impulse_response(&mut delay, 400);

        assert!((out[0] - 0.5).abs() < 1e-6, "dry path at half level");
        let energy = |from: usize| -> f32 { out[from..from + 50].iter().map(|s| s * s).sum() };
        let first = energy(90);
        let second = energy(190);
        assert!(first > 0.01, "first echo missing: {first}");
        assert!(
            second < first * 0.5 && second > 0.0,
            "second echo should be quieter: {first} then {second}"
        );
    }

    #[test]
    fn disabled_delay_passes_dry() {
        let mut disabled = settings();
        disabled.delay_enabled = false;
        let mut delay = FeedbackDelay::new(&disabled, SAMPLE_RATE);
        let out = impulse_response(&mut delay, 300);
        assert_eq!(out[0], 1.0);
        assert!(out[1..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn feedback_is_capped() {
        let mut hot = settings();
        hot.feedback = 4.0;
        let mut delay = FeedbackDelay::new(&hot, SAMPLE_RATE);
        let out = impulse_response(&mut delay, 5_000);
        let tail = out[4_000..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(tail < 0.5, "loop must not grow: {tail}");
    }

    #[test]
    fn dotted_whole_at_slowest_tempo_echoes_on_time() {
        use crate::patch::SynthParams;
        use crate::sequencing::{tempo::MIN_BPM, Duration};

        const RATE: f32 = 100.0;
        let mut params = SynthParams::default();
        params.delay.duration = Duration::WHOLE.dotted();
        params.delay.feedback = 0.0;
        params.delay.mix = 1.0;
        let settings = params.clamped().effect_settings(MIN_BPM);
        assert_eq!(settings.delay_seconds, 18.0);

        let mut delay = FeedbackDelay::new(&settings, RATE);
        let mut block = vec![0.0f32; 2_000];
        block[0] = 1.0;
        delay.render_block(&mut block, &RenderCtx::new(RATE, 0.0));

        let first_echo = block.iter().position(|s| s.abs() > 1e-6);
        assert_eq!(first_echo, Some(1_800), "echo 18 s after the impulse");
    }

    #[test]
    fn reconfigure_rebuilds_cascade_on_order_change() {
        let mut delay = FeedbackDelay::new(&settings(), SAMPLE_RATE);
        assert_eq!(delay.cascade().stage_count(), 1);

        let mut next = settings();
        next.filter_order = FilterOrder::TwentyFour;
        delay.configure(&next);
        assert_eq!(delay.cascade().stage_count(), 4);
        assert_eq!(delay.cascade().generation(), 1);

        next.filter_frequency = 200.0;
        delay.configure(&next);
        assert_eq!(delay.cascade().generation(), 1);
    }
}
