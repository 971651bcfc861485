// Purely for testing: an engine with a hand-cranked clock that records what
// the sequencer asked of it.

use std::collections::HashSet;

use crate::audio_api::{AudioEngine, AudioTime, SampleId, VoiceHandle};

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledVoice {
    pub handle: VoiceHandle,
    pub sample: SampleId,
    pub start: AudioTime,
    pub gain: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTone {
    pub handle: VoiceHandle,
    pub freq: f32,
    pub start: AudioTime,
    pub duration: f64,
}

#[derive(Default)]
pub struct FakeEngine {
    pub clock: AudioTime,
    pub ready: HashSet<SampleId>,
    pub voices: Vec<ScheduledVoice>,
    pub tones: Vec<ScheduledTone>,
    pub stopped: Vec<VoiceHandle>,
    live: HashSet<VoiceHandle>,
    next_handle: u64,
}

impl FakeEngine {
    pub fn with_ready(samples: &[u64]) -> Self {
        Self {
            ready: samples.iter().map(|s| SampleId(*s)).collect(),
            ..Self::default()
        }
    }

    pub fn advance(&mut self, secs: f64) {
        self.clock += secs;
    }

    // simulate a voice running out of sample data
    pub fn finish(&mut self, handle: VoiceHandle) {
        self.live.remove(&handle);
    }

    pub fn live_voices(&self) -> Vec<&ScheduledVoice> {
        self.voices.iter().filter(|v| self.live.contains(&v.handle)).collect()
    }

    // tones that were scheduled, not stopped, and have not started yet
    pub fn pending_tones(&self) -> usize {
        self.tones
            .iter()
            .filter(|t| t.start > self.clock && !self.stopped.contains(&t.handle))
            .count()
    }

    fn alloc(&mut self) -> VoiceHandle {
        self.next_handle += 1;
        let handle = VoiceHandle(self.next_handle);
        self.live.insert(handle);
        handle
    }
}

impl AudioEngine for FakeEngine {
    type Buffer = SampleId;

    fn now(&self) -> AudioTime {
        self.clock
    }

    fn buffer(&self, sample: SampleId) -> Option<SampleId> {
        self.ready.contains(&sample).then_some(sample)
    }

    fn schedule_voice(&mut self, buffer: &SampleId, start: AudioTime, gain: f32) -> VoiceHandle {
        let handle = self.alloc();
        self.voices.push(ScheduledVoice { handle, sample: *buffer, start, gain });
        handle
    }

    fn stop_voice(&mut self, handle: VoiceHandle) {
        self.live.remove(&handle);
        self.stopped.push(handle);
    }

    fn schedule_tone(&mut self, freq: f32, start: AudioTime, duration: f64) -> VoiceHandle {
        let handle = self.alloc();
        self.tones.push(ScheduledTone { handle, freq, start, duration });
        handle
    }

    fn is_voice_active(&self, handle: VoiceHandle) -> bool {
        self.live.contains(&handle)
    }
}
