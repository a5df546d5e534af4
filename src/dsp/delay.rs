/// Circular delay line with fractional (linearly interpolated) reads.
///
/// Capacity is fixed at construction so the render path never allocates.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(2)],
            write_pos: 0,
        }
    }

    pub fn with_max_seconds(max_seconds: f32, sample_rate: f32) -> Self {
        Self::new((max_seconds * sample_rate).ceil() as usize + 1)
    }

    /// Longest delay a read may ask for.
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 1) as f32
    }

    /// Read the sample written `delay_samples` writes ago (1.0 = the last write).
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, self.max_delay());
        let whole = delay.floor();
        let frac = delay - whole;

        let idx_a = (self.write_pos + len - whole as usize) % len;
        let idx_b = (idx_a + len - 1) % len;
        let a = self.buffer[idx_a];
        let b = self.buffer[idx_b];
        a + (b - a) * frac
    }

    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Plain delay: write `sample` and return the one from `delay_samples` ago.
    pub fn next_sample(&mut self, sample: f32, delay_samples: f32) -> f32 {
        let delayed = self.read_interpolated(delay_samples);
        self.write(sample);
        delayed
    }

    pub fn render(&mut self, buffer: &mut [f32], delay_samples: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay_samples);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_delay_returns_impulse_on_time() {
        let mut line = DelayLine::new(64);
        let mut buffer = vec![0.0f32; 32];
        buffer[0] = 1.0;
        line.render(&mut buffer, 10.0);
        assert_eq!(buffer[10], 1.0);
        assert_eq!(buffer.iter().filter(|&&s| s != 0.0).count(), 1);
    }

    #[test]
    fn fractional_delay_interpolates() {
        let mut line = DelayLine::new(64);
        let mut buffer = vec![0.0f32; 32];
        buffer[0] = 1.0;
        line.render(&mut buffer, 4.5);
        assert!((buffer[4] - 0.5).abs() < 1e-6);
        assert!((buffer[5] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut line = DelayLine::new(8);
        for i in 0..20 {
            let out = line.next_sample(i as f32, 1_000.0);
            assert!(out.is_finite());
        }
        assert_eq!(line.max_delay(), 7.0);
    }
}
