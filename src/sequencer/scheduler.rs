// Lookahead scheduler.
//
// Each tick looks `lookahead` seconds past the engine clock and hands every
// step that starts inside that window to the engine, stamped with the step's
// exact audio-clock time. How late or early the tick itself ran does not
// matter as long as it runs again before the window is used up.

use crate::audio_api::{AudioEngine, AudioTime, VoiceHandle};
use crate::shared::STEPS_PER_PATTERN;
use super::pads::PadBank;
use super::pattern::StepMatrix;
use super::voices::VoiceManager;

const LAST_STEP: usize = STEPS_PER_PATTERN - 1;
const STEPS_PER_BEAT: usize = 4;

// sixteenth note: a quarter is 60/bpm, four steps per quarter
pub fn seconds_per_step(bpm: u16) -> f64 {
    15.0 / bpm as f64
}

pub fn seconds_per_beat(bpm: u16) -> f64 {
    60.0 / bpm as f64
}

/// Metronome and count-in click voicing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickTones {
    pub accent_hz: f32,
    pub beat_hz: f32,
    pub duration: f64,
}

impl Default for ClickTones {
    fn default() -> Self {
        Self {
            accent_hz: 1000.0,
            beat_hz: 800.0,
            duration: 0.05,
        }
    }
}

impl ClickTones {
    pub fn click<E: AudioEngine>(&self, engine: &mut E, at: AudioTime, accent: bool) -> VoiceHandle {
        let freq = if accent { self.accent_hz } else { self.beat_hz };
        engine.schedule_tone(freq, at, self.duration)
    }
}

// Everything a tick reads but does not own.
pub struct StepSource<'a> {
    pub pattern: &'a StepMatrix,
    pub pads: &'a PadBank,
    pub voices: &'a VoiceManager,
    pub bpm: u16,
    pub looping: bool,
    pub metronome: Option<&'a ClickTones>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    // one-shot pass reached the end of the pattern
    Finished,
}

#[derive(Clone, Debug)]
pub struct Scheduler {
    lookahead: f64,
    next_step_time: AudioTime,
    // audio-clock time each step was last scheduled at
    step_times: [Option<AudioTime>; STEPS_PER_PATTERN],
    current_step: Option<usize>,
    running: bool,
}

impl Scheduler {
    pub fn new(lookahead: f64) -> Self {
        Self {
            lookahead,
            next_step_time: 0.0,
            step_times: [None; STEPS_PER_PATTERN],
            current_step: None,
            running: false,
        }
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    #[cfg(test)]
    pub fn next_step_time(&self) -> AudioTime {
        self.next_step_time
    }

    // `at` is engine time: `now()` for a plain start, or the downbeat a
    // count-in ended on.
    pub fn start(&mut self, at: AudioTime) {
        self.current_step = None;
        self.step_times = [None; STEPS_PER_PATTERN];
        self.next_step_time = at;
        self.running = true;
    }

    // Sound already handed to the engine is left to play out.
    pub fn stop(&mut self) {
        self.current_step = None;
        self.running = false;
    }

    pub fn tick<E: AudioEngine>(&mut self, engine: &mut E, src: &StepSource<'_>) -> TickOutcome {
        if !self.running {
            return TickOutcome::Continue;
        }
        let horizon = engine.now() + self.lookahead;
        while self.next_step_time < horizon {
            if self.current_step == Some(LAST_STEP) && !src.looping {
                self.stop();
                return TickOutcome::Finished;
            }
            let step = self.current_step.map_or(0, |s| (s + 1) % STEPS_PER_PATTERN);
            self.schedule_step(engine, src, step, self.next_step_time);
            self.current_step = Some(step);
            self.step_times[step] = Some(self.next_step_time);
            self.next_step_time += seconds_per_step(src.bpm);
        }
        TickOutcome::Continue
    }

    fn schedule_step<E: AudioEngine>(&self, engine: &mut E, src: &StepSource<'_>, step: usize, time: AudioTime) {
        for (pad, velocity) in src.pattern.active_at(step) {
            if src.pads.is_muted(pad) {
                continue;
            }
            src.voices.trigger_sequenced(engine, src.pads, pad, time, velocity);
        }
        if let Some(tones) = src.metronome {
            if step % STEPS_PER_BEAT == 0 {
                tones.click(engine, time, step == 0);
            }
        }
    }

    /// The step whose grid time is closest to `now`. `current_step` may
    /// already be up to a lookahead ahead of what is audible, so this can
    /// land before it as well as after. Only times steps were actually
    /// scheduled at count, so a tempo change never shifts the grid behind us.
    pub fn nearest_step(&self, now: AudioTime) -> Option<usize> {
        let current = self.current_step?;
        let upcoming = ((current + 1) % STEPS_PER_PATTERN, self.next_step_time);
        let scheduled = self
            .step_times
            .iter()
            .enumerate()
            .filter_map(|(step, t)| t.map(|t| (step, t)));
        scheduled
            .chain(std::iter::once(upcoming))
            .min_by(|a, b| (a.1 - now).abs().total_cmp(&(b.1 - now).abs()))
            .map(|(step, _)| step)
    }
}
