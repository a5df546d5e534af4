use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, info};

use crate::{
    backend::{AudioGraph, GraphCommand, Retired, SignalChain},
    engine::MAX_VOICES,
    error::BackendError,
    MAX_BLOCK_SIZE,
};

/// Commands that may be in flight between two audio callbacks.
const QUEUE_CAPACITY: usize = 256;
/// Voices the callback keeps at once.
const VOICE_LIMIT: usize = MAX_VOICES * 2;
/// Boxes waiting to be freed off the audio thread. A teardown retires every
/// voice plus the effects chain in one go.
const RETIRE_CAPACITY: usize = QUEUE_CAPACITY + VOICE_LIMIT + 1;

/// Backend on the default output device.
///
/// The device is opened on the first `resume()`. Commands travel to the
/// audio callback through a lock-free ring and the boxes it lets go of come
/// back through a second one, to be freed on the next `send()`. The callback
/// counts frames in an atomic that serves as the playback clock.
pub struct RealtimeGraph {
    stream: Option<cpal::Stream>,
    producer: Option<Producer<GraphCommand>>,
    retired: Option<Consumer<Retired>>,
    frames: Arc<AtomicU64>,
    sample_rate: f32,
}

impl RealtimeGraph {
    pub fn new() -> Self {
        Self {
            stream: None,
            producer: None,
            retired: None,
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate: 48_000.0,
        }
    }

    fn open(&mut self) -> Result<(), BackendError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(BackendError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|err| BackendError::Config(err.to_string()))?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels,
            "opening output stream"
        );

        let (producer, mut consumer) = RingBuffer::<GraphCommand>::new(QUEUE_CAPACITY);
        let (retire_producer, retired) = RingBuffer::<Retired>::new(RETIRE_CAPACITY);
        let mut chain = SignalChain::realtime(sample_rate, VOICE_LIMIT, retire_producer);
        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];
        let frames = Arc::clone(&self.frames);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    chain.drain(&mut consumer);

                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;
                    while frames_written < total_frames {
                        let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let (l, r) = (
                            &mut left[..frames_to_render],
                            &mut right[..frames_to_render],
                        );
                        chain.render(l, r);

                        let out_off = frames_written * channels;
                        for (i, (&ls, &rs)) in l.iter().zip(r.iter()).enumerate() {
                            let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                            match frame {
                                [mono] => *mono = (ls + rs) * 0.5,
                                [fl, fr, rest @ ..] => {
                                    *fl = ls;
                                    *fr = rs;
                                    rest.fill(0.0);
                                }
                                [] => {}
                            }
                        }
                        frames_written += frames_to_render;
                    }
                    chain.prune_finished();
                    frames.store(chain.frames(), Ordering::Release);
                },
                |err| error!("audio stream error: {err}"),
                None,
            )
            .map_err(|err| BackendError::BuildStream(err.to_string()))?;

        self.sample_rate = sample_rate;
        self.producer = Some(producer);
        self.retired = Some(retired);
        self.stream = Some(stream);
        Ok(())
    }

    /// Free whatever the callback has retired since the last call.
    fn collect_retired(&mut self) {
        if let Some(retired) = self.retired.as_mut() {
            while retired.pop().is_ok() {}
        }
    }
}

impl Default for RealtimeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGraph for RealtimeGraph {
    fn resume(&mut self) -> Result<(), BackendError> {
        if self.stream.is_none() {
            self.open()?;
        }
        match &self.stream {
            Some(stream) => stream
                .play()
                .map_err(|err| BackendError::Stream(err.to_string())),
            None => Err(BackendError::NoDevice),
        }
    }

    fn suspend(&mut self) -> Result<(), BackendError> {
        self.collect_retired();
        match &self.stream {
            Some(stream) => stream
                .pause()
                .map_err(|err| BackendError::Stream(err.to_string())),
            None => Ok(()),
        }
    }

    fn current_time(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn send(&mut self, command: GraphCommand) -> Result<(), BackendError> {
        self.collect_retired();
        let producer = self.producer.as_mut().ok_or(BackendError::NoDevice)?;
        producer.push(command).map_err(|_| BackendError::QueueFull)
    }
}
