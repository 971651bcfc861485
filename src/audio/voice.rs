use std::sync::Arc;

use crate::audio_api::VoiceHandle;
use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

// Where a voice starts inside the block that begins at `block_start`.
// `None` means it does not start in this block at all.
fn offset_in_block(start_frame: u64, block_start: u64, block_len: usize) -> Option<usize> {
    let offset = start_frame.saturating_sub(block_start);
    (offset < block_len as u64).then_some(offset as usize)
}

#[derive(Clone, Debug)]
pub enum VoiceKind {
    Sample { buffer: Arc<SampleBuffer>, gain: f32, pos: usize },
    // decaying sine for metronome clicks
    Tone { phase: f32, phase_inc: f32, amp: f32, decay: f32, remaining: u64 },
}

#[derive(Clone, Debug)]
pub struct Voice {
    pub handle: VoiceHandle,
    pub start_frame: u64,
    pub active: bool,
    kind: VoiceKind,
}

impl Voice {
    pub fn sample(handle: VoiceHandle, buffer: Arc<SampleBuffer>, start_frame: u64, gain: f32) -> Self {
        Self {
            handle,
            start_frame,
            active: true,
            kind: VoiceKind::Sample { buffer, gain, pos: 0 },
        }
    }

    pub fn tone(handle: VoiceHandle, freq: f32, start_frame: u64, length_frames: u64, sample_rate: f32) -> Self {
        let length = length_frames.max(1);
        // fall to roughly -60dB over the click length
        let decay = 0.001f32.powf(1.0 / length as f32);
        Self {
            handle,
            start_frame,
            active: true,
            kind: VoiceKind::Tone {
                phase: 0.0,
                phase_inc: std::f32::consts::TAU * freq / sample_rate,
                amp: 0.3,
                decay,
                remaining: length,
            },
        }
    }

    // Mix this voice into `out`, whose first frame is `block_start` on the
    // render clock. Voices due in a later block are left untouched.
    pub fn render_into(&mut self, out: &mut [StereoFrame], block_start: u64) {
        if !self.active {
            return;
        }
        let Some(offset) = offset_in_block(self.start_frame, block_start, out.len()) else {
            return;
        };
        let out = &mut out[offset..];

        match &mut self.kind {
            VoiceKind::Sample { buffer, gain, pos } => {
                let data = &buffer.data;
                let n = out.len().min(data.len().saturating_sub(*pos));
                for (frame, src) in out.iter_mut().zip(&data[*pos..*pos + n]) {
                    frame.add_scaled(*src, *gain);
                }
                *pos += n;
                if *pos >= data.len() {
                    self.active = false;
                }
            }
            VoiceKind::Tone { phase, phase_inc, amp, decay, remaining } => {
                for frame in out.iter_mut() {
                    if *remaining == 0 {
                        break;
                    }
                    frame.add_scaled(StereoFrame::mono(phase.sin()), *amp);
                    *phase += *phase_inc;
                    if *phase > std::f32::consts::TAU {
                        *phase -= std::f32::consts::TAU;
                    }
                    *amp *= *decay;
                    *remaining -= 1;
                }
                if *remaining == 0 {
                    self.active = false;
                }
            }
        }
        // once started, the rest of the voice follows straight on
        self.start_frame = block_start + out.len() as u64 + offset as u64;
    }
}
