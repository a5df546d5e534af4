//! Benchmarks for the full signal chain: voices into delay and reverb.

use std::hint::black_box;

use ambient_walk::backend::{GraphCommand, SignalChain, VoiceId};
use ambient_walk::dsp::reverb::ImpulseResponse;
use ambient_walk::graph::EffectsChain;
use ambient_walk::patch::SynthParams;
use ambient_walk::synth::{Voice, VoiceSpec};
use criterion::{BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn chain(voices: usize, reverb: bool) -> SignalChain {
    let params = SynthParams::default();
    let mut chain = SignalChain::new(SAMPLE_RATE, voices);

    let impulse = if reverb {
        ImpulseResponse::synthesize(SAMPLE_RATE, &mut StdRng::seed_from_u64(3)).ok()
    } else {
        None
    };
    let effects = EffectsChain::new(
        &params.effect_settings(60.0),
        impulse.as_ref(),
        SAMPLE_RATE,
    );
    chain.apply(GraphCommand::BuildEffects {
        chain: Box::new(effects),
    });

    for i in 0..voices {
        let spec = VoiceSpec::new(48 + (i as u8 * 7) % 36, 0.0, 3_600.0, &params);
        chain.apply(GraphCommand::StartVoice {
            id: VoiceId(i as u64),
            voice: Box::new(Voice::new(spec)),
        });
    }
    chain
}

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // A typical moment: a few overlapping notes
        let mut typical = chain(8, true);
        group.bench_with_input(BenchmarkId::new("8_voices", size), &size, |b, _| {
            b.iter(|| typical.render(black_box(&mut left), black_box(&mut right)))
        });

        // Worst case: the pool is full
        let mut full = chain(32, true);
        group.bench_with_input(BenchmarkId::new("32_voices", size), &size, |b, _| {
            b.iter(|| full.render(black_box(&mut left), black_box(&mut right)))
        });

        // Delay only, to isolate the cost of convolution
        let mut dry = chain(8, false);
        group.bench_with_input(BenchmarkId::new("8_voices_no_reverb", size), &size, |b, _| {
            b.iter(|| dry.render(black_box(&mut left), black_box(&mut right)))
        });
    }

    group.finish();
}
