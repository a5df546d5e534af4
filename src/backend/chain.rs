use tracing::trace;

use crate::{
    backend::{CommandReceiver, DropRetired, GraphCommand, RetireSink, Retired, VoiceId},
    graph::{EffectsChain, GraphNode, RenderCtx},
    patch::EffectSettings,
    synth::Voice,
    MAX_BLOCK_SIZE,
};

/// Voices summed into the effects chain, driven by [`GraphCommand`]s.
///
/// Commands take effect at block boundaries; voice onsets and stops are
/// sample accurate because voices carry their own times. Buffers are sized
/// up front, so rendering does not allocate.
///
/// Every box the chain lets go of goes to its [`RetireSink`]. A realtime
/// chain also has a hard voice limit: once full, a new voice replaces the
/// oldest one, so the voice list never grows past its allocation.
pub struct SignalChain<S: RetireSink = DropRetired> {
    sample_rate: f32,
    frames: u64,
    voices: Vec<(VoiceId, Box<Voice>)>,
    voice_limit: Option<usize>,
    effects: Option<Box<EffectsChain>>,
    pending_settings: Option<(EffectSettings, f64)>,
    mix_buffer: Vec<f32>,
    voice_buffer: Vec<f32>,
    sink: S,
}

impl SignalChain<DropRetired> {
    /// Chain for non-realtime rendering. `voice_capacity` is only a hint.
    pub fn new(sample_rate: f32, voice_capacity: usize) -> Self {
        Self::build(sample_rate, voice_capacity, None, DropRetired)
    }
}

impl<S: RetireSink> SignalChain<S> {
    /// Chain for the audio thread: at most `voice_limit` voices, retired
    /// boxes handed to `sink`.
    pub fn realtime(sample_rate: f32, voice_limit: usize, sink: S) -> Self {
        Self::build(sample_rate, voice_limit, Some(voice_limit), sink)
    }

    fn build(sample_rate: f32, capacity: usize, voice_limit: Option<usize>, sink: S) -> Self {
        Self {
            sample_rate,
            frames: 0,
            voices: Vec::with_capacity(capacity),
            voice_limit,
            effects: None,
            pending_settings: None,
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
            voice_buffer: vec![0.0; MAX_BLOCK_SIZE],
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Clock time of the next frame to be rendered.
    pub fn time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn effects(&self) -> Option<&EffectsChain> {
        self.effects.as_deref()
    }

    pub fn apply(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::BuildEffects { chain } => {
                if let Some(previous) = self.effects.replace(chain) {
                    self.sink.retire(Retired::Effects(previous));
                }
                self.pending_settings = None;
            }
            GraphCommand::ConfigureEffects { settings, at } => {
                self.pending_settings = Some((settings, at));
            }
            GraphCommand::StartVoice { id, voice } => {
                if self.is_full() {
                    self.prune_finished();
                }
                if self.is_full() {
                    self.steal_oldest();
                }
                self.voices.push((id, voice));
            }
            GraphCommand::StopVoice { id, at } => {
                match self.voices.iter_mut().find(|(voice_id, _)| *voice_id == id) {
                    Some((_, voice)) => voice.stop(at),
                    None => trace!(%id, "stop for unknown voice ignored"),
                }
            }
            GraphCommand::RemoveVoice { id } => {
                match self.voices.iter().position(|(voice_id, _)| *voice_id == id) {
                    Some(index) => {
                        let (_, voice) = self.voices.swap_remove(index);
                        self.sink.retire(Retired::Voice(voice));
                    }
                    None => trace!(%id, "remove for unknown voice ignored"),
                }
            }
            GraphCommand::Teardown => {
                for (_, voice) in self.voices.drain(..) {
                    self.sink.retire(Retired::Voice(voice));
                }
                if let Some(effects) = self.effects.take() {
                    self.sink.retire(Retired::Effects(effects));
                }
                self.pending_settings = None;
            }
        }
    }

    /// Apply every queued command.
    pub fn drain<R: CommandReceiver>(&mut self, receiver: &mut R) {
        while let Some(command) = receiver.pop() {
            self.apply(command);
        }
    }

    /// Drop voices that will never make sound again.
    pub fn prune_finished(&mut self) {
        let mut index = 0;
        while index < self.voices.len() {
            if self.voices[index].1.is_active() {
                index += 1;
            } else {
                let (_, voice) = self.voices.swap_remove(index);
                self.sink.retire(Retired::Voice(voice));
            }
        }
    }

    fn is_full(&self) -> bool {
        self.voice_limit
            .is_some_and(|limit| limit > 0 && self.voices.len() >= limit)
    }

    /// Make room by retiring the voice with the earliest start.
    fn steal_oldest(&mut self) {
        let oldest = self
            .voices
            .iter()
            .enumerate()
            .min_by(|(_, (_, a)), (_, (_, b))| a.spec().start.total_cmp(&b.spec().start))
            .map(|(index, _)| index);
        if let Some(index) = oldest {
            let (id, voice) = self.voices.swap_remove(index);
            trace!(%id, "voice limit reached, stealing oldest");
            self.sink.retire(Retired::Voice(voice));
        }
    }

    /// Render `left.len()` frames of stereo output.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        let total = left.len().min(right.len());
        let mut offset = 0;
        while offset < total {
            let frames = (total - offset).min(MAX_BLOCK_SIZE);
            self.render_block(
                &mut left[offset..offset + frames],
                &mut right[offset..offset + frames],
            );
            offset += frames;
        }
    }

    fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len();
        let ctx = RenderCtx::new(self.sample_rate, self.time());
        let block_end = ctx.sample_time(frames);

        if let Some((settings, at)) = self.pending_settings {
            if at < block_end {
                if let Some(effects) = self.effects.as_mut() {
                    effects.configure(&settings);
                }
                self.pending_settings = None;
            }
        }

        let mix = &mut self.mix_buffer[..frames];
        mix.fill(0.0);
        for (_, voice) in self.voices.iter_mut() {
            if !voice.is_active() || voice.spec().start >= block_end {
                continue;
            }
            let buffer = &mut self.voice_buffer[..frames];
            voice.render_block(buffer, &ctx);
            for (out, &sample) in mix.iter_mut().zip(buffer.iter()) {
                *out += sample;
            }
        }

        match self.effects.as_mut() {
            Some(effects) => effects.render(mix, left, right),
            None => {
                left.copy_from_slice(mix);
                right.copy_from_slice(mix);
            }
        }

        self.frames += frames as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{EffectSettings, SynthParams};
    use crate::synth::VoiceSpec;
    use std::collections::VecDeque;

    const SAMPLE_RATE: f32 = 8_000.0;

    fn voice(start: f64, duration: f64) -> Box<Voice> {
        Box::new(Voice::new(VoiceSpec::new(
            60,
            start,
            duration,
            &SynthParams::default(),
        )))
    }

    fn render<S: RetireSink>(chain: &mut SignalChain<S>, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        chain.render(&mut left, &mut right);
        (left, right)
    }

    #[test]
    fn clock_advances_with_rendered_frames() {
        let mut chain = SignalChain::new(SAMPLE_RATE, 4);
        render(&mut chain, 5_000);
        assert_eq!(chain.frames(), 5_000);
        assert!((chain.time() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn voices_follow_commands() {
        let mut chain = SignalChain::new(SAMPLE_RATE, 4);
        let mut queue = VecDeque::new();
        queue.push_back(GraphCommand::StartVoice {
            id: VoiceId(1),
            voice: voice(0.0, 1.0),
        });
        queue.push_back(GraphCommand::StartVoice {
            id: VoiceId(2),
            voice: voice(0.0, 1.0),
        });
        queue.push_back(GraphCommand::RemoveVoice { id: VoiceId(1) });
        queue.push_back(GraphCommand::RemoveVoice { id: VoiceId(99) });
        queue.push_back(GraphCommand::StopVoice {
            id: VoiceId(42),
            at: 0.0,
        });
        chain.drain(&mut queue);
        assert_eq!(chain.voice_count(), 1);

        let (left, right) = render(&mut chain, 8_000);
        assert!(left.iter().any(|&s| s != 0.0));
        assert_eq!(left, right, "no effects: both channels carry the dry mix");

        chain.apply(GraphCommand::Teardown);
        assert_eq!(chain.voice_count(), 0);
        let (left, _) = render(&mut chain, 512);
        assert!(left.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn stopped_voice_is_pruned_after_fade() {
        let mut chain = SignalChain::new(SAMPLE_RATE, 4);
        chain.apply(GraphCommand::StartVoice {
            id: VoiceId(7),
            voice: voice(0.0, 30.0),
        });
        render(&mut chain, 800);
        chain.apply(GraphCommand::StopVoice {
            id: VoiceId(7),
            at: chain.time(),
        });
        render(&mut chain, 800);
        chain.prune_finished();
        assert_eq!(chain.voice_count(), 0);
    }

    fn effects() -> Box<EffectsChain> {
        Box::new(EffectsChain::new(&EffectSettings::default(), None, SAMPLE_RATE))
    }

    fn retired_voices(chain: &SignalChain<Vec<Retired>>) -> usize {
        chain
            .sink()
            .iter()
            .filter(|retired| matches!(retired, Retired::Voice(_)))
            .count()
    }

    #[test]
    fn released_boxes_go_to_the_sink() {
        let mut chain = SignalChain::realtime(SAMPLE_RATE, 8, Vec::new());
        chain.apply(GraphCommand::BuildEffects { chain: effects() });
        chain.apply(GraphCommand::BuildEffects { chain: effects() });
        assert!(matches!(chain.sink().as_slice(), [Retired::Effects(_)]));

        for id in 0..3 {
            chain.apply(GraphCommand::StartVoice {
                id: VoiceId(id),
                voice: voice(0.0, 1.0),
            });
        }
        chain.apply(GraphCommand::RemoveVoice { id: VoiceId(0) });
        assert_eq!(retired_voices(&chain), 1);

        chain.apply(GraphCommand::Teardown);
        assert_eq!(chain.voice_count(), 0);
        assert!(chain.effects().is_none());
        assert_eq!(retired_voices(&chain), 3);
        assert_eq!(chain.sink().len(), 5);
    }

    #[test]
    fn full_chain_replaces_its_oldest_voice() {
        let mut chain = SignalChain::realtime(SAMPLE_RATE, 2, Vec::new());
        for (id, start) in [(1, 0.5), (2, 0.0), (3, 1.0)] {
            chain.apply(GraphCommand::StartVoice {
                id: VoiceId(id),
                voice: voice(start, 10.0),
            });
        }
        assert_eq!(chain.voice_count(), 2);
        assert!(
            matches!(chain.sink().as_slice(), [Retired::Voice(v)] if v.spec().start == 0.0),
            "the voice starting first is the one stolen"
        );
    }

    #[test]
    fn full_chain_prefers_finished_voices() {
        let mut chain = SignalChain::realtime(SAMPLE_RATE, 2, Vec::new());
        chain.apply(GraphCommand::StartVoice {
            id: VoiceId(1),
            voice: voice(0.0, 30.0),
        });
        chain.apply(GraphCommand::StartVoice {
            id: VoiceId(2),
            voice: voice(0.05, 30.0),
        });
        render(&mut chain, 800);
        chain.apply(GraphCommand::StopVoice {
            id: VoiceId(2),
            at: chain.time(),
        });
        render(&mut chain, 800);

        chain.apply(GraphCommand::StartVoice {
            id: VoiceId(3),
            voice: voice(1.0, 1.0),
        });
        assert_eq!(chain.voice_count(), 2);
        assert!(matches!(chain.sink().as_slice(), [Retired::Voice(v)] if v.spec().start == 0.05));
    }

    #[test]
    fn offline_chain_has_no_voice_limit() {
        let mut chain = SignalChain::new(SAMPLE_RATE, 2);
        for id in 0..10 {
            chain.apply(GraphCommand::StartVoice {
                id: VoiceId(id),
                voice: voice(0.0, 1.0),
            });
        }
        assert_eq!(chain.voice_count(), 10);
    }
}
