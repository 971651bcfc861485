// Count-in preroll before a recording pass.
//
// Clicks go through the same lookahead window as steps, so at any moment only
// the clicks inside the window have been handed to the engine. Their handles
// are kept until the count-in ends so a cancel can silence anything that has
// not played yet.

use crate::audio_api::{AudioEngine, AudioTime, VoiceHandle};
use super::scheduler::{seconds_per_beat, ClickTones};

const BEATS_PER_BAR: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CountInStatus {
    Counting,
    Cancelled,
    // every click is out and the first step is inside the window
    Complete { downbeat: AudioTime },
}

#[derive(Debug)]
pub struct CountIn {
    total: usize,
    scheduled: usize,
    first_click: AudioTime,
    beat: f64,
    handles: Vec<VoiceHandle>,
    cancelled: bool,
}

impl CountIn {
    pub fn new(bars: u8, bpm: u16, first_click: AudioTime) -> Self {
        let total = bars as usize * BEATS_PER_BAR;
        Self {
            total,
            scheduled: 0,
            first_click,
            beat: seconds_per_beat(bpm),
            handles: Vec::with_capacity(total),
            cancelled: false,
        }
    }

    #[cfg(test)]
    pub fn total_clicks(&self) -> usize {
        self.total
    }

    #[cfg(test)]
    pub fn clicks_scheduled(&self) -> usize {
        self.scheduled
    }

    fn click_time(&self, index: usize) -> AudioTime {
        self.first_click + index as f64 * self.beat
    }

    // Where the pattern's first step lands: one beat after the last click.
    pub fn downbeat(&self) -> AudioTime {
        self.click_time(self.total)
    }

    pub fn tick<E: AudioEngine>(&mut self, engine: &mut E, tones: &ClickTones, lookahead: f64) -> CountInStatus {
        if self.cancelled {
            return CountInStatus::Cancelled;
        }
        let horizon = engine.now() + lookahead;
        while self.scheduled < self.total && self.click_time(self.scheduled) < horizon {
            let at = self.click_time(self.scheduled);
            let accent = self.scheduled % BEATS_PER_BAR == 0;
            self.handles.push(tones.click(engine, at, accent));
            self.scheduled += 1;
        }
        if self.scheduled == self.total && self.downbeat() < horizon {
            return CountInStatus::Complete { downbeat: self.downbeat() };
        }
        CountInStatus::Counting
    }

    // Stops every click handed out so far. Clicks that already played are
    // unaffected; the ones still waiting in the engine never sound.
    pub fn cancel<E: AudioEngine>(&mut self, engine: &mut E) {
        for handle in self.handles.drain(..) {
            engine.stop_voice(handle);
        }
        self.cancelled = true;
    }
}
