/// Linear parameter ramp.
///
/// Setting a new target starts a straight-line glide from the current value
/// that lands exactly on the target after the requested number of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl Smoothed {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Glide to `target` over `ramp_samples` samples (0 jumps immediately).
    pub fn set_target(&mut self, target: f32, ramp_samples: u32) {
        self.target = target;
        if ramp_samples == 0 || self.current == target {
            self.current = target;
            self.step = 0.0;
            self.remaining = 0;
        } else {
            self.step = (target - self.current) / ramp_samples as f32;
            self.remaining = ramp_samples;
        }
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settling(&self) -> bool {
        self.remaining > 0
    }
}

/// Number of samples in a ramp of `seconds`.
pub fn ramp_samples(seconds: f32, sample_rate: f32) -> u32 {
    (seconds * sample_rate).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_linearly_and_lands_on_target() {
        let mut p = Smoothed::new(0.0);
        p.set_target(1.0, 4);
        let values: Vec<f32> = (0..6).map(|_| p.next_value()).collect();
        assert_eq!(values, vec![0.25, 0.5, 0.75, 1.0, 1.0, 1.0]);
        assert!(!p.is_settling());
    }

    #[test]
    fn retarget_mid_ramp_starts_from_current_value() {
        let mut p = Smoothed::new(0.0);
        p.set_target(1.0, 4);
        p.next_value();
        p.next_value();
        p.set_target(0.0, 2);
        assert!((p.next_value() - 0.25).abs() < 1e-6);
        assert_eq!(p.next_value(), 0.0);
    }

    #[test]
    fn zero_length_ramp_jumps() {
        let mut p = Smoothed::new(0.3);
        p.set_target(0.9, 0);
        assert_eq!(p.value(), 0.9);
        assert_eq!(ramp_samples(0.05, 48_000.0), 2_400);
    }
}
