use std::f32::consts::TAU;

/// Phase-accumulating sine oscillator.
///
/// Phase is kept in cycles (0.0 to 1.0) so frequency changes between samples
/// never cause a discontinuity, which is what makes per-sample vibrato work.
#[derive(Debug, Clone, Default)]
pub struct OscillatorBlock {
    phase: f32,
}

impl OscillatorBlock {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Produce one sample and advance by `frequency / sample_rate` cycles.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = (TAU * self.phase).sin();
        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        out
    }

    /// Fill `destination` at a fixed frequency.
    pub fn render(&mut self, destination: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in destination.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }

    /// Fill `destination` following a per-sample frequency track.
    pub fn render_modulated(&mut self, destination: &mut [f32], frequencies: &[f32], sample_rate: f32) {
        for (sample, &frequency) in destination.iter_mut().zip(frequencies) {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
