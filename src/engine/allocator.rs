use std::collections::VecDeque;

use crate::{backend::VoiceId, synth::voice::STOP_FADE_SECONDS};

/// Most voices tracked at once; the oldest is evicted beyond this.
pub const MAX_VOICES: usize = 32;
/// How long past its end a voice is kept before being released.
pub const GRACE_SECONDS: f64 = 0.5;

/// Bookkeeping for a voice the backend is rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveVoice {
    pub id: VoiceId,
    pub start: f64,
    pub end: f64,
}

/// Fixed-capacity ring of live voices, oldest first.
///
/// Evicted voices are faded out by the caller and parked here until their
/// fade has certainly finished, so every voice handed to the backend is
/// eventually released exactly once.
pub struct VoicePool {
    voices: VecDeque<ActiveVoice>,
    retiring: Vec<(VoiceId, f64)>,
    capacity: usize,
}

impl VoicePool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            voices: VecDeque::with_capacity(capacity),
            retiring: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveVoice> {
        self.voices.iter()
    }

    /// Track a new voice. When full, the oldest is evicted and returned so
    /// the caller can stop it; it is released by a later `cleanup`.
    pub fn push(&mut self, voice: ActiveVoice, now: f64) -> Option<ActiveVoice> {
        let evicted = if self.voices.len() >= self.capacity {
            self.voices.pop_front()
        } else {
            None
        };
        if let Some(old) = evicted {
            self.retiring
                .push((old.id, now + STOP_FADE_SECONDS + GRACE_SECONDS));
        }
        self.voices.push_back(voice);
        evicted
    }

    /// Voices whose end passed more than the grace margin before `now`,
    /// plus evicted voices whose fade is over. They are forgotten here and
    /// should be released by the caller.
    pub fn cleanup(&mut self, now: f64) -> Vec<VoiceId> {
        let mut expired = Vec::new();
        self.voices.retain(|voice| {
            let done = now > voice.end + GRACE_SECONDS;
            if done {
                expired.push(voice.id);
            }
            !done
        });
        self.retiring.retain(|&(id, release_at)| {
            let done = now >= release_at;
            if done {
                expired.push(id);
            }
            !done
        });
        expired
    }

    /// Forget every voice, returning all ids for release.
    pub fn drain(&mut self) -> Vec<VoiceId> {
        self.voices
            .drain(..)
            .map(|voice| voice.id)
            .chain(self.retiring.drain(..).map(|(id, _)| id))
            .collect()
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new(MAX_VOICES)
    }
}
