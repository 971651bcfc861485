use crate::audio_api::SampleId;
use crate::shared::NUM_PADS;

pub const DEFAULT_PAD_VOLUME: f32 = 0.8;

// One of the 16 performance slots. The sample itself lives in the engine,
// the pad only holds the reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Pad {
    pub sample: Option<SampleId>,
    pub muted: bool,
    pub volume: f32, // 0.0 to 1.0
}

impl Default for Pad {
    fn default() -> Self {
        Self {
            sample: None,
            muted: false,
            volume: DEFAULT_PAD_VOLUME,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PadBank {
    pads: [Pad; NUM_PADS],
}

impl Default for PadBank {
    fn default() -> Self {
        Self {
            pads: std::array::from_fn(|_| Pad::default()),
        }
    }
}

impl PadBank {
    pub fn get(&self, pad: usize) -> Option<&Pad> {
        self.pads.get(pad)
    }

    pub fn assign_sample(&mut self, pad: usize, sample: SampleId) {
        if let Some(p) = self.pads.get_mut(pad) {
            p.sample = Some(sample);
        }
    }

    // Back to an empty slot. Steps for this pad are not touched.
    pub fn clear(&mut self, pad: usize) {
        if let Some(p) = self.pads.get_mut(pad) {
            *p = Pad::default();
        }
    }

    pub fn toggle_mute(&mut self, pad: usize) {
        if let Some(p) = self.pads.get_mut(pad) {
            p.muted = !p.muted;
        }
    }

    pub fn set_volume(&mut self, pad: usize, volume: f32) {
        if let Some(p) = self.pads.get_mut(pad) {
            p.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        }
    }

    pub fn is_muted(&self, pad: usize) -> bool {
        self.pads.get(pad).is_some_and(|p| p.muted)
    }

    pub fn assigned_count(&self) -> usize {
        self.pads.iter().filter(|p| p.sample.is_some()).count()
    }
}
