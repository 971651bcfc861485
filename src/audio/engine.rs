// Render side. Lives inside the cpal callback: no locks, no file access, and
// the voice pool never grows past its initial capacity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::audio_api::{AudioCommand, VoiceHandle};
use super::frame::StereoFrame;
use super::voice::Voice;

pub const MAX_VOICES: usize = 64; // hard cap so we wont malloc in audio callback

pub struct Engine {
    sample_rate: f32,
    voices: Vec<Voice>,
    // frames rendered so far; the control side reads this as the audio clock
    clock: Arc<AtomicU64>,
    finished_tx: Option<Sender<VoiceHandle>>,
}

impl Engine {
    pub fn new(sample_rate: u32, clock: Arc<AtomicU64>) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            voices: Vec::with_capacity(MAX_VOICES),
            clock,
            finished_tx: None,
        }
    }

    pub fn set_finished_tx(&mut self, tx: Sender<VoiceHandle>) {
        self.finished_tx = Some(tx);
    }

    #[cfg(test)]
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::PlaySample { handle, buffer, start_frame, gain } => {
                self.push_voice(Voice::sample(handle, buffer, start_frame, gain));
            }
            AudioCommand::PlayTone { handle, freq, start_frame, length_frames } => {
                let voice = Voice::tone(handle, freq, start_frame, length_frames, self.sample_rate);
                self.push_voice(voice);
            }
            AudioCommand::Stop(handle) => {
                if let Some(i) = self.voices.iter().position(|v| v.handle == handle) {
                    let voice = self.voices.swap_remove(i);
                    self.report_finished(voice.handle);
                }
            }
        }
    }

    fn push_voice(&mut self, voice: Voice) {
        if self.voices.len() == MAX_VOICES {
            // steal the voice that started earliest
            if let Some(oldest) = self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.start_frame)
                .map(|(i, _)| i)
            {
                let stolen = self.voices.swap_remove(oldest);
                self.report_finished(stolen.handle);
            }
        }
        self.voices.push(voice);
    }

    fn report_finished(&self, handle: VoiceHandle) {
        if let Some(tx) = &self.finished_tx {
            let _ = tx.try_send(handle);
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::default());
        let block_start = self.clock.load(Ordering::Acquire);

        for voice in self.voices.iter_mut() {
            voice.render_into(out, block_start);
        }

        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].active {
                i += 1;
            } else {
                let done = self.voices.swap_remove(i);
                self.report_finished(done.handle);
            }
        }

        self.clock.fetch_add(out.len() as u64, Ordering::Release);
    }
}
