//! Reverb - Room Simulation via Convolution
//!
//! Instead of a network of comb and allpass filters, the reverb convolves
//! the signal with a synthetic impulse response: the recorded "answer" of an
//! imaginary room to a single click.
//!
//! # Impulse Response
//!
//! ```text
//! amp
//!  │ │  │ │   │     │
//!  │▌▌▌▌▌▌▌▌▌▌▌▓▓▓▓▒▒▒▒▒░░░░░░░░····
//!  └──┬───────────────────────────────→ t
//!   early            exp(-t / 2.5)      3 s
//! reflections
//! ```
//!
//! Each channel is 3 seconds of white noise under an `exp(-t / 2.5)` decay,
//! plus six sparse early reflections inside the first 100 ms whose sign and
//! magnitude are drawn independently. The two channels use different noise,
//! which is what makes the tail sound wide. The result is scaled to unit
//! energy so the wet level does not depend on the sample rate.
//!
//! # Uniformly Partitioned Convolution
//!
//! A 3 second impulse is far too long for direct convolution, so it is cut
//! into `PARTITION`-sample pieces, each transformed once up front:
//!
//! ```text
//! H0 H1 H2 ... Hk          (impulse partitions, frequency domain)
//! X0 X1 X2 ... Xk          (last k input blocks, newest first)
//!
//! Y = Σ Xi · Hi            (one complex multiply-add per partition)
//! ```
//!
//! Each input block is transformed together with the previous block
//! (overlap-save), and the second half of the inverse transform is the
//! output. Output therefore lags input by exactly one partition.

use std::sync::Arc;

use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::ReverbError;

/// Impulse length in seconds.
pub const IMPULSE_SECONDS: f32 = 3.0;
/// Time constant of the noise tail.
pub const DECAY_SECONDS: f32 = 2.5;
/// Early reflection offsets in milliseconds.
pub const EARLY_REFLECTIONS_MS: [f32; 6] = [7.1, 13.3, 23.9, 41.7, 59.3, 83.9];
/// Samples per partition, and the latency of the wet path.
pub const PARTITION: usize = 256;

/// A stereo impulse response.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: f32,
}

impl ImpulseResponse {
    /// Build the synthetic room impulse for `sample_rate`.
    pub fn synthesize<R: Rng + ?Sized>(sample_rate: f32, rng: &mut R) -> Result<Self, ReverbError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ReverbError::InvalidSampleRate(sample_rate));
        }
        let len = (sample_rate * IMPULSE_SECONDS) as usize;
        let left = synthesize_channel(len, sample_rate, rng);
        let right = synthesize_channel(len, sample_rate, rng);
        Self::from_channels(left, right, sample_rate)
    }

    /// Wrap existing channels, scaling each to unit energy.
    pub fn from_channels(
        mut left: Vec<f32>,
        mut right: Vec<f32>,
        sample_rate: f32,
    ) -> Result<Self, ReverbError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ReverbError::InvalidSampleRate(sample_rate));
        }
        normalize_energy(&mut left)?;
        normalize_energy(&mut right)?;
        Ok(Self {
            left,
            right,
            sample_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.left.len().max(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_seconds(&self) -> f32 {
        self.len() as f32 / self.sample_rate
    }
}

fn synthesize_channel<R: Rng + ?Sized>(len: usize, sample_rate: f32, rng: &mut R) -> Vec<f32> {
    let mut channel: Vec<f32> = (0..len)
        .map(|n| {
            let t = n as f32 / sample_rate;
            rng.gen_range(-1.0f32..1.0) * (-t / DECAY_SECONDS).exp()
        })
        .collect();

    for ms in EARLY_REFLECTIONS_MS {
        let index = (ms * 0.001 * sample_rate).round() as usize;
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let magnitude = rng.gen_range(0.2f32..0.8);
        if let Some(sample) = channel.get_mut(index) {
            *sample += sign * magnitude;
        }
    }
    channel
}

fn normalize_energy(channel: &mut [f32]) -> Result<(), ReverbError> {
    let energy: f32 = channel.iter().map(|s| s * s).sum();
    if channel.is_empty() || !energy.is_finite() || energy <= 0.0 {
        return Err(ReverbError::EmptyImpulse);
    }
    let scale = energy.sqrt().recip();
    for sample in channel.iter_mut() {
        *sample *= scale;
    }
    Ok(())
}

/// Mono uniformly partitioned overlap-save convolver.
///
/// All buffers are sized at construction; `process` never allocates.
pub struct PartitionedConvolver {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,

    /// Spectra of the impulse partitions (bins 0..=PARTITION only)
    partitions: Vec<Vec<Complex<f32>>>,
    /// Spectra of past input blocks, ring indexed by `fdl_head`
    history: Vec<Vec<Complex<f32>>>,
    fdl_head: usize,

    previous_block: Vec<f32>,
    input_block: Vec<f32>,
    output_block: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    accumulator: Vec<Complex<f32>>,
    position: usize,
}

impl PartitionedConvolver {
    pub fn new(impulse: &[f32]) -> Self {
        let fft_size = PARTITION * 2;
        let bins = PARTITION + 1;

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex::new(0.0, 0.0); scratch_len];

        let count = impulse.len().div_ceil(PARTITION).max(1);
        let mut partitions = Vec::with_capacity(count);
        let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];
        for index in 0..count {
            buffer.fill(Complex::new(0.0, 0.0));
            let start = index * PARTITION;
            let end = (start + PARTITION).min(impulse.len());
            if start < end {
                for (slot, &h) in buffer.iter_mut().zip(&impulse[start..end]) {
                    slot.re = h;
                }
            }
            forward.process_with_scratch(&mut buffer, &mut scratch);
            partitions.push(buffer[..bins].to_vec());
        }

        Self {
            forward,
            inverse,
            scratch,
            history: vec![vec![Complex::new(0.0, 0.0); bins]; count],
            partitions,
            fdl_head: 0,
            previous_block: vec![0.0; PARTITION],
            input_block: vec![0.0; PARTITION],
            output_block: vec![0.0; PARTITION],
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            accumulator: vec![Complex::new(0.0, 0.0); bins],
            position: 0,
        }
    }

    /// Samples between an input and its first contribution to the output.
    pub fn latency(&self) -> usize {
        PARTITION
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.output_block[self.position];
        self.input_block[self.position] = input;
        self.position += 1;
        if self.position == PARTITION {
            self.position = 0;
            self.convolve_block();
        }
        out
    }

    fn convolve_block(&mut self) {
        let bins = PARTITION + 1;
        let count = self.partitions.len();

        // [previous | current] -> spectrum
        for (slot, &x) in self
            .spectrum
            .iter_mut()
            .zip(self.previous_block.iter().chain(self.input_block.iter()))
        {
            *slot = Complex::new(x, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        self.fdl_head = (self.fdl_head + count - 1) % count;
        self.history[self.fdl_head].copy_from_slice(&self.spectrum[..bins]);

        self.accumulator.fill(Complex::new(0.0, 0.0));
        for (age, partition) in self.partitions.iter().enumerate() {
            let past = &self.history[(self.fdl_head + age) % count];
            for ((acc, &x), &h) in self.accumulator.iter_mut().zip(past).zip(partition) {
                *acc += x * h;
            }
        }

        // Real input and impulse give a Hermitian product; mirror the upper half
        let fft_size = PARTITION * 2;
        self.spectrum[..bins].copy_from_slice(&self.accumulator);
        for k in 1..PARTITION {
            self.spectrum[fft_size - k] = self.accumulator[k].conj();
        }
        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let scale = 1.0 / fft_size as f32;
        for (out, value) in self
            .output_block
            .iter_mut()
            .zip(&self.spectrum[PARTITION..])
        {
            *out = value.re * scale;
        }

        self.previous_block.copy_from_slice(&self.input_block);
    }

    pub fn reset(&mut self) {
        for spectrum in self.history.iter_mut() {
            spectrum.fill(Complex::new(0.0, 0.0));
        }
        self.previous_block.fill(0.0);
        self.input_block.fill(0.0);
        self.output_block.fill(0.0);
        self.position = 0;
    }
}
