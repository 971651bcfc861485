use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::{AudioCommand, AudioEngine, AudioTime, VoiceHandle};

mod engine;
mod frame;
mod sample_buffer;
mod voice;

pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;

use engine::{Engine, MAX_VOICES};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleId(pub u64);

/// Control-thread side of the cpal output. Implements [`AudioEngine`] for
/// the sequencer: decoded buffers live here, playback requests go to the
/// render callback as [`AudioCommand`]s stamped with absolute frames.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: Arc<AtomicU64>,
    sample_rate: u32,
    buffers: HashMap<SampleId, Arc<SampleBuffer>>,
    next_sample: u64,
    next_voice: u64,
    live: RefCell<LiveVoices>,
    _output_stream: cpal::Stream,
}

// Handles the render side hasn't reported finished yet. Every access drains
// the finished queue first, so the set only holds voices that can still
// sound and the queue never backs up while the sequencer keeps scheduling.
struct LiveVoices {
    finished_rx: Receiver<VoiceHandle>,
    handles: HashSet<VoiceHandle>,
}

impl LiveVoices {
    fn new(finished_rx: Receiver<VoiceHandle>) -> Self {
        Self { finished_rx, handles: HashSet::new() }
    }

    fn drain(&mut self) {
        for done in self.finished_rx.try_iter() {
            self.handles.remove(&done);
        }
    }

    fn insert(&mut self, handle: VoiceHandle) {
        self.drain();
        self.handles.insert(handle);
    }

    fn remove(&mut self, handle: VoiceHandle) -> bool {
        self.drain();
        self.handles.remove(&handle)
    }

    fn contains(&mut self, handle: VoiceHandle) -> bool {
        self.drain();
        self.handles.contains(&handle)
    }
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn register(&mut self, buffer: SampleBuffer) -> SampleId {
        let id = SampleId(self.next_sample);
        self.next_sample += 1;
        self.buffers.insert(id, Arc::new(buffer));
        id
    }

    fn send(&self, cmd: AudioCommand) {
        if let Err(e) = self.tx.try_send(cmd) {
            log::warn!(target: "audio", "command dropped: {e}");
        }
    }

    fn to_frame(&self, t: AudioTime) -> u64 {
        (t.max(0.0) * self.sample_rate as f64).round() as u64
    }

    fn next_handle(&mut self) -> VoiceHandle {
        self.next_voice += 1;
        let handle = VoiceHandle(self.next_voice);
        self.live.get_mut().insert(handle);
        handle
    }
}

impl AudioEngine for AudioHandle {
    type Buffer = Arc<SampleBuffer>;

    fn now(&self) -> AudioTime {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn buffer(&self, sample: SampleId) -> Option<Arc<SampleBuffer>> {
        self.buffers.get(&sample).cloned()
    }

    fn schedule_voice(&mut self, buffer: &Arc<SampleBuffer>, start: AudioTime, gain: f32) -> VoiceHandle {
        let handle = self.next_handle();
        self.send(AudioCommand::PlaySample {
            handle,
            buffer: Arc::clone(buffer),
            start_frame: self.to_frame(start),
            gain,
        });
        handle
    }

    fn stop_voice(&mut self, handle: VoiceHandle) {
        if self.live.get_mut().remove(handle) {
            self.send(AudioCommand::Stop(handle));
        }
    }

    fn schedule_tone(&mut self, freq: f32, start: AudioTime, duration: f64) -> VoiceHandle {
        let handle = self.next_handle();
        self.send(AudioCommand::PlayTone {
            handle,
            freq,
            start_frame: self.to_frame(start),
            length_frames: self.to_frame(duration).max(1),
        });
        handle
    }

    fn is_voice_active(&self, handle: VoiceHandle) -> bool {
        self.live.borrow_mut().contains(handle)
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let (finished_tx, finished_rx) = crossbeam_channel::bounded::<VoiceHandle>(MAX_VOICES * 4);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let clock = Arc::new(AtomicU64::new(0));

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let mut engine = Engine::new(sample_rate, clock.clone());
            engine.set_finished_tx(finished_tx);
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play().context("failed to play output stream")?;
            log::info!(target: "audio", "output running at {sample_rate} Hz, {channels} channel(s)");

            Ok(AudioHandle {
                tx,
                clock,
                sample_rate,
                buffers: HashMap::new(),
                next_sample: 0,
                next_voice: 0,
                live: RefCell::new(LiveVoices::new(finished_rx)),
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let err_fn = |err| log::error!(target: "audio", "output stream error: {err}");
    // sized for a typical block; only grows if the device asks for more
    let mut scratch: Vec<StereoFrame> = vec![StereoFrame::default(); 4096];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if scratch.len() < n_frames {
                scratch.resize(n_frames, StereoFrame::default());
            }
            let frames = &mut scratch[..n_frames];
            engine.render_block(frames);

            for (out, frame) in data.chunks_exact_mut(channels.max(1)).zip(frames.iter()) {
                frame.write_interleaved(out);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
