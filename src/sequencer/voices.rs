// Two deliberately separate trigger paths:
//   manual    - monophonic preview, the one live handle is tracked so it can be
//               preempted or released
//   sequenced - fire and forget, as many overlapping voices as the pattern asks for

use crate::audio_api::{AudioEngine, AudioTime, VoiceHandle};
use super::pads::PadBank;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualVoice {
    pub pad: usize,
    pub handle: VoiceHandle,
}

#[derive(Debug, Default)]
pub struct VoiceManager {
    manual: Option<ManualVoice>,
}

impl VoiceManager {
    pub fn manual_voice(&self) -> Option<ManualVoice> {
        self.manual
    }

    /// Starts `pad` right now, cutting off whatever was manually playing.
    /// Silently does nothing when the pad is empty or its buffer isn't ready;
    /// in that case the previous manual voice keeps sounding.
    pub fn trigger_manual<E: AudioEngine>(
        &mut self,
        engine: &mut E,
        pads: &PadBank,
        pad: usize,
    ) -> Option<VoiceHandle> {
        let Some(slot) = pads.get(pad) else {
            return None;
        };
        let Some(sample) = slot.sample else {
            log::debug!(target: "sequencer", "pad {pad} has no sample, manual trigger ignored");
            return None;
        };
        let Some(buffer) = engine.buffer(sample) else {
            log::debug!(target: "sequencer", "pad {pad} buffer not ready, manual trigger ignored");
            return None;
        };

        if let Some(previous) = self.manual.take() {
            engine.stop_voice(previous.handle);
        }
        let start = engine.now();
        let handle = engine.schedule_voice(&buffer, start, slot.volume);
        self.manual = Some(ManualVoice { pad, handle });
        Some(handle)
    }

    pub fn release<E: AudioEngine>(&mut self, engine: &mut E) {
        if let Some(voice) = self.manual.take() {
            engine.stop_voice(voice.handle);
        }
    }

    // Only cuts the manual voice if it belongs to `pad`.
    pub fn release_pad<E: AudioEngine>(&mut self, engine: &mut E, pad: usize) {
        if self.manual.is_some_and(|v| v.pad == pad) {
            self.release(engine);
        }
    }

    // Forget the manual voice once it has played out on its own.
    pub fn reap<E: AudioEngine>(&mut self, engine: &E) {
        if let Some(voice) = self.manual {
            if !engine.is_voice_active(voice.handle) {
                self.manual = None;
            }
        }
    }

    /// Schedules one hit of `pad` at `time` on the audio clock. Nothing is
    /// kept; the voice ends by itself.
    pub fn trigger_sequenced<E: AudioEngine>(
        &self,
        engine: &mut E,
        pads: &PadBank,
        pad: usize,
        time: AudioTime,
        velocity: f32,
    ) -> bool {
        let Some(slot) = pads.get(pad) else {
            return false;
        };
        let Some(buffer) = slot.sample.and_then(|s| engine.buffer(s)) else {
            return false;
        };
        engine.schedule_voice(&buffer, time, slot.volume * velocity);
        true
    }
}
