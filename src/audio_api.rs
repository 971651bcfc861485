pub use crate::audio::{SampleBuffer, SampleId};

use std::sync::Arc;

// Seconds on the audio engine's own clock. Everything the sequencer hands to
// the engine is expressed in this unit, never in wall-clock time.
pub type AudioTime = f64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceHandle(pub u64);

/// What the sequencer needs from whatever is actually making sound.
///
/// `buffer` returning `None` means "not decoded yet"; callers treat that as
/// a no-op. Stopping or querying a handle that already finished is harmless.
pub trait AudioEngine {
    type Buffer;

    fn now(&self) -> AudioTime;
    fn buffer(&self, sample: SampleId) -> Option<Self::Buffer>;
    fn schedule_voice(&mut self, buffer: &Self::Buffer, start: AudioTime, gain: f32) -> VoiceHandle;
    fn stop_voice(&mut self, handle: VoiceHandle);
    fn schedule_tone(&mut self, freq: f32, start: AudioTime, duration: f64) -> VoiceHandle;
    fn is_voice_active(&self, handle: VoiceHandle) -> bool;
}

// Commands crossing from the control thread into the render callback. Start
// times are absolute frame positions on the render clock.
#[derive(Clone, Debug)]
pub enum AudioCommand {
    PlaySample {
        handle: VoiceHandle,
        buffer: Arc<SampleBuffer>,
        start_frame: u64,
        gain: f32,
    },
    PlayTone {
        handle: VoiceHandle,
        freq: f32,
        start_frame: u64,
        length_frames: u64,
    },
    Stop(VoiceHandle),
}
