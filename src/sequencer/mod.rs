// The pad sequencer: one owner for the step matrix, the pads, the transport
// and the engine handle. Everything runs on the control thread; the engine's
// render thread only ever sees timed commands.

pub mod count_in;
pub mod pads;
pub mod pattern;
pub mod presets;
pub mod scheduler;
pub mod state;
pub mod tempo;
pub mod ticker;
pub mod voices;

#[cfg(test)]
pub mod test_fixture;

use std::time::{Duration, Instant};

use crate::audio_api::{AudioEngine, SampleId, VoiceHandle};
use crate::config::EngineConfig;

use count_in::{CountIn, CountInStatus};
use pads::PadBank;
use pattern::StepMatrix;
use presets::{builtin_presets, PresetPattern};
use scheduler::{ClickTones, Scheduler, StepSource, TickOutcome};
use state::{CountInBars, EditMode, PlayMode, RecordQuantize, SequencerState, Transport};
use tempo::TapTempo;
use ticker::Ticker;
use voices::VoiceManager;

pub struct Sequencer<E: AudioEngine> {
    engine: E,
    state: SequencerState,
    pattern: StepMatrix,
    pads: PadBank,
    voices: VoiceManager,
    scheduler: Scheduler,
    ticker: Ticker,
    tap: TapTempo,
    count_in: Option<CountIn>,
    clicks: ClickTones,
    edit_mode: EditMode,
    play_mode: PlayMode,
    record_quantize: RecordQuantize,
    presets: Vec<PresetPattern>,
}

impl<E: AudioEngine> Sequencer<E> {
    pub fn new(engine: E, config: &EngineConfig) -> Self {
        let mut state = SequencerState::default();
        state.set_bpm(config.default_bpm as i64);
        state.count_in = config.count_in_bars;

        let mut presets = builtin_presets();
        presets.extend(config.presets.iter().cloned());

        Self {
            engine,
            state,
            pattern: StepMatrix::default(),
            pads: PadBank::default(),
            voices: VoiceManager::default(),
            scheduler: Scheduler::new(config.lookahead_secs()),
            ticker: Ticker::new(config.tick_interval()),
            tap: TapTempo::new(config.tap_history, config.tap_reset()),
            count_in: None,
            clicks: config.click_tones(),
            edit_mode: EditMode::Grid,
            play_mode: config.play_mode,
            record_quantize: config.record_quantize,
            presets,
        }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn pattern(&self) -> &StepMatrix {
        &self.pattern
    }

    pub fn pads(&self) -> &PadBank {
        &self.pads
    }

    pub fn presets(&self) -> &[PresetPattern] {
        &self.presets
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn manual_voice(&self) -> Option<voices::ManualVoice> {
        self.voices.manual_voice()
    }

    // ── Pads ───────────────────────────────────────────────────────

    pub fn assign_sample(&mut self, pad: usize, sample: SampleId) {
        self.pads.assign_sample(pad, sample);
    }

    // Empties the slot. The pad's steps stay in the matrix.
    pub fn clear_pad(&mut self, pad: usize) {
        self.voices.release_pad(&mut self.engine, pad);
        self.pads.clear(pad);
    }

    pub fn toggle_mute(&mut self, pad: usize) {
        self.pads.toggle_mute(pad);
    }

    pub fn set_volume(&mut self, pad: usize, volume: f32) {
        self.pads.set_volume(pad, volume);
    }

    // ── Manual triggers ────────────────────────────────────────────

    /// Plays `pad` now, replacing any manual voice. While recording, the
    /// hit is also written into the pattern if that cell is still empty.
    pub fn trigger_pad_manual(&mut self, pad: usize) -> Option<VoiceHandle> {
        if self.state.recording && self.state.playing() {
            let step = match self.record_quantize {
                RecordQuantize::Current => self.scheduler.current_step(),
                RecordQuantize::Nearest => self.scheduler.nearest_step(self.engine.now()),
            };
            if let Some(step) = step {
                if self.pattern.record_hit(pad, step) {
                    log::debug!(target: "sequencer", "overdub pad {pad} step {step}");
                }
            }
        }
        self.voices.trigger_manual(&mut self.engine, &self.pads, pad)
    }

    pub fn release_pad(&mut self) {
        self.voices.release(&mut self.engine);
    }

    // ── Transport ──────────────────────────────────────────────────

    pub fn toggle_play(&mut self) {
        match self.state.transport {
            Transport::Idle => self.start(Instant::now()),
            Transport::CountingIn | Transport::Playing => self.stop(),
        }
    }

    fn start(&mut self, now: Instant) {
        let count_in_bars = self.state.count_in.bars();
        if self.state.recording && count_in_bars > 0 {
            log::info!(target: "sequencer", "count-in {count_in_bars} bar(s) at {} bpm", self.state.bpm);
            self.count_in = Some(CountIn::new(count_in_bars, self.state.bpm, self.engine.now()));
            self.state.transport = Transport::CountingIn;
        } else {
            let at = self.engine.now();
            self.begin_playback(at);
        }
        self.tick();
        // a one-shot pattern at extreme settings could already be done
        if self.state.transport != Transport::Idle {
            self.ticker.arm(now);
        }
    }

    fn begin_playback(&mut self, at: f64) {
        log::info!(target: "sequencer", "playback started at {at:.3}s, {} bpm", self.state.bpm);
        self.scheduler.start(at);
        self.state.transport = Transport::Playing;
    }

    /// Cancels the ticker and any count-in before returning; nothing else
    /// will be scheduled after this. Recording is switched off.
    pub fn stop(&mut self) {
        self.ticker.cancel();
        if let Some(mut count_in) = self.count_in.take() {
            count_in.cancel(&mut self.engine);
        }
        self.scheduler.stop();
        if self.state.transport != Transport::Idle {
            log::info!(target: "sequencer", "stopped");
        }
        self.state.transport = Transport::Idle;
        self.state.recording = false;
        self.state.current_step = None;
    }

    pub fn toggle_metronome(&mut self) {
        self.state.metronome_on = !self.state.metronome_on;
    }

    pub fn toggle_looping(&mut self) {
        self.state.looping = !self.state.looping;
    }

    pub fn toggle_recording(&mut self) {
        self.state.recording = !self.state.recording;
    }

    pub fn set_count_in_bars(&mut self, bars: u8) {
        match CountInBars::try_from(bars) {
            Ok(c) => self.state.count_in = c,
            Err(e) => log::debug!(target: "sequencer", "{e}"),
        }
    }

    pub fn cycle_count_in(&mut self) {
        self.state.count_in = self.state.count_in.next();
    }

    pub fn set_bpm(&mut self, bpm: i64) {
        self.state.set_bpm(bpm);
    }

    pub fn nudge_bpm(&mut self, delta: i64) {
        self.state.set_bpm(self.state.bpm as i64 + delta);
    }

    // Takes effect from the next scheduled step.
    pub fn tap_tempo(&mut self, now: Instant) -> Option<u16> {
        let bpm = self.tap.tap(now)?;
        self.state.bpm = bpm;
        Some(bpm)
    }

    // ── Ticking ────────────────────────────────────────────────────

    /// Drives the scheduler from the control loop. Cheap to call often; it
    /// only schedules when the ticker is due.
    pub fn poll(&mut self, now: Instant) {
        if self.ticker.fire(now) {
            self.tick();
        } else {
            // a preview can run out while the transport is idle
            self.voices.reap(&self.engine);
        }
    }

    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.ticker.time_until_due(now)
    }

    // One scheduling pass against the engine clock.
    pub fn tick(&mut self) {
        match self.state.transport {
            Transport::Idle => {}
            Transport::CountingIn => {
                let status = match self.count_in.as_mut() {
                    Some(c) => c.tick(&mut self.engine, &self.clicks, self.scheduler.lookahead()),
                    None => CountInStatus::Cancelled,
                };
                match status {
                    CountInStatus::Counting => {}
                    CountInStatus::Complete { downbeat } => {
                        self.count_in = None;
                        self.begin_playback(downbeat);
                        self.schedule_steps();
                    }
                    CountInStatus::Cancelled => self.stop(),
                }
            }
            Transport::Playing => self.schedule_steps(),
        }
        self.voices.reap(&self.engine);
    }

    fn schedule_steps(&mut self) {
        let src = StepSource {
            pattern: &self.pattern,
            pads: &self.pads,
            voices: &self.voices,
            bpm: self.state.bpm,
            looping: self.state.looping,
            metronome: self.state.metronome_on.then_some(&self.clicks),
        };
        match self.scheduler.tick(&mut self.engine, &src) {
            TickOutcome::Continue => self.state.current_step = self.scheduler.current_step(),
            TickOutcome::Finished => {
                log::debug!(target: "sequencer", "one-shot pass finished");
                self.stop();
            }
        }
    }

    // ── Pattern editing ────────────────────────────────────────────

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.pattern.end_drag();
        self.edit_mode = mode;
    }

    /// Pointer-down on a cell, interpreted by the current edit mode.
    pub fn pointer_down(&mut self, pad: usize, step: usize, y: f32) {
        match self.edit_mode {
            EditMode::Grid => {
                self.paint_step(pad, step);
            }
            EditMode::Velocity => self.pattern.velocity_press(pad, step, y),
        }
    }

    pub fn paint_step(&mut self, pad: usize, step: usize) -> Option<f32> {
        self.pattern.paint_step(pad, step)
    }

    pub fn drag_paint_enter(&mut self, pad: usize, step: usize) {
        self.pattern.drag_paint_enter(pad, step);
    }

    pub fn velocity_drag(&mut self, y: f32) {
        self.pattern.velocity_drag(y);
    }

    pub fn end_drag(&mut self) {
        self.pattern.end_drag();
    }

    pub fn set_velocity(&mut self, pad: usize, step: usize, value: f32) {
        self.pattern.set_velocity(pad, step, value);
    }

    pub fn load_preset(&mut self, preset: &PresetPattern) {
        log::debug!(target: "sequencer", "loading preset {} ({})", preset.name, preset.category);
        self.pattern.load_preset(preset);
    }

    pub fn load_preset_index(&mut self, index: usize) -> Option<&str> {
        let preset = self.presets.get(index)?.clone();
        self.load_preset(&preset);
        self.presets.get(index).map(|p| p.name.as_str())
    }

    pub fn clear_pad_steps(&mut self, pad: usize) {
        self.pattern.clear_pad(pad);
    }

    pub fn clear_all(&mut self) {
        self.pattern.clear_all();
    }

    // ── Teardown ───────────────────────────────────────────────────

    pub fn shutdown(&mut self) {
        self.stop();
        self.voices.release(&mut self.engine);
    }
}

impl<E: AudioEngine> Drop for Sequencer<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixture::FakeEngine;

    const STEP: f64 = 0.125; // at 120 bpm

    fn seq() -> Sequencer<FakeEngine> {
        let mut s = Sequencer::new(FakeEngine::with_ready(&[1, 2, 3]), &EngineConfig::default());
        s.assign_sample(0, SampleId(1));
        s.assign_sample(1, SampleId(2));
        s.assign_sample(2, SampleId(3));
        s
    }

    // advance the engine clock in ticker-sized slices
    fn run_for(s: &mut Sequencer<FakeEngine>, secs: f64) {
        let slices = (secs / 0.025).round() as usize;
        for _ in 0..slices {
            s.engine_mut().advance(0.025);
            s.tick();
        }
    }

    #[test]
    fn play_and_stop() {
        let mut s = seq();
        s.set_velocity(0, 0, 1.0);
        assert_eq!(s.state().current_step, None);

        s.toggle_play();
        assert_eq!(s.state().transport, Transport::Playing);
        assert_eq!(s.state().current_step, Some(0));
        assert_eq!(s.engine().voices.len(), 1);
        assert!(s.time_until_tick(Instant::now()).is_some());

        s.toggle_play();
        assert_eq!(s.state().transport, Transport::Idle);
        assert_eq!(s.state().current_step, None);
        assert!(s.time_until_tick(Instant::now()).is_none());

        // nothing more is scheduled once stopped
        run_for(&mut s, 1.0);
        assert_eq!(s.engine().voices.len(), 1);
    }

    #[test]
    fn stop_clears_recording() {
        let mut s = seq();
        s.toggle_recording();
        s.toggle_play();
        assert!(s.state().recording);
        s.stop();
        assert!(!s.state().recording);
    }

    #[test]
    fn looping_pattern_wraps() {
        let mut s = seq();
        s.set_velocity(0, 0, 1.0);
        s.toggle_play();
        run_for(&mut s, 16.0 * STEP);
        assert_eq!(s.state().current_step, Some(0));
        assert_eq!(s.engine().voices.len(), 2);
        assert_eq!(s.engine().voices[1].start, 2.0);
    }

    #[test]
    fn one_shot_pattern_returns_to_idle() {
        let mut s = seq();
        s.toggle_looping();
        s.set_velocity(0, 0, 1.0);
        s.toggle_play();
        run_for(&mut s, 1.85);
        assert_eq!(s.state().current_step, Some(15));
        assert_eq!(s.state().transport, Transport::Playing);
        run_for(&mut s, 0.1);
        assert_eq!(s.state().transport, Transport::Idle);
        assert_eq!(s.state().current_step, None);
        assert_eq!(s.engine().voices.len(), 1);
    }

    #[test]
    fn count_in_runs_four_clicks_then_plays() {
        let mut s = seq();
        s.set_count_in_bars(1);
        s.toggle_recording();
        s.set_velocity(0, 0, 1.0);
        s.toggle_play();
        assert_eq!(s.state().transport, Transport::CountingIn);
        assert_eq!(s.state().current_step, None);

        run_for(&mut s, 1.875);
        assert_eq!(s.state().transport, Transport::CountingIn);
        assert_eq!(s.engine().tones.len(), 4);
        assert!(s.engine().voices.is_empty());

        run_for(&mut s, 0.05);
        assert_eq!(s.state().transport, Transport::Playing);
        assert_eq!(s.engine().tones.len(), 4);
        // first step sits exactly one beat after the last click
        assert_eq!(s.engine().voices[0].start, 2.0);
        assert_eq!(s.state().current_step, Some(0));
        assert!(s.state().recording);
    }

    #[test]
    fn count_in_only_when_recording() {
        let mut s = seq();
        s.set_count_in_bars(2);
        s.toggle_play();
        assert_eq!(s.state().transport, Transport::Playing);
        assert!(s.engine().tones.is_empty());
    }

    #[test]
    fn cancel_during_count_in() {
        let mut s = seq();
        s.set_count_in_bars(1);
        s.toggle_recording();
        s.toggle_play();
        run_for(&mut s, 0.45);
        assert_eq!(s.engine().pending_tones(), 1);

        s.toggle_play();
        assert_eq!(s.state().transport, Transport::Idle);
        assert_eq!(s.state().current_step, None);
        assert!(!s.state().recording);
        assert_eq!(s.engine().pending_tones(), 0);

        run_for(&mut s, 3.0);
        assert_eq!(s.engine().tones.len(), 2);
        assert!(s.engine().voices.is_empty());
    }

    #[test]
    fn invalid_count_in_is_ignored() {
        let mut s = seq();
        s.set_count_in_bars(2);
        s.set_count_in_bars(3);
        assert_eq!(s.state().count_in, CountInBars::Two);
    }

    #[test]
    fn overdub_first_hit_wins() {
        let mut s = seq();
        s.set_velocity(2, 5, 0.4);
        s.toggle_recording();
        s.toggle_play();
        // steps up to 5 (0.625s) are inside the window at 0.55s
        run_for(&mut s, 0.55);
        assert_eq!(s.state().current_step, Some(5));

        s.trigger_pad_manual(2);
        assert_eq!(s.pattern().velocity(2, 5), 0.4);

        s.trigger_pad_manual(1);
        assert_eq!(s.pattern().velocity(1, 5), 1.0);
    }

    #[test]
    fn no_overdub_without_playback() {
        let mut s = seq();
        s.toggle_recording();
        s.trigger_pad_manual(1);
        assert_eq!(s.pattern().active_count(), 0);

        s.toggle_recording();
        s.toggle_play();
        s.trigger_pad_manual(1);
        assert_eq!(s.pattern().active_count(), 0);
    }

    #[test]
    fn nearest_quantize_can_land_before_current() {
        let config = EngineConfig {
            record_quantize: RecordQuantize::Nearest,
            ..EngineConfig::default()
        };
        let mut s = Sequencer::new(FakeEngine::with_ready(&[1]), &config);
        s.assign_sample(0, SampleId(1));
        s.toggle_recording();
        s.toggle_play();
        run_for(&mut s, 0.55);
        assert_eq!(s.state().current_step, Some(5));
        // 0.55s is closer to step 4 (0.5s) than step 5 (0.625s)
        s.trigger_pad_manual(0);
        assert_eq!(s.pattern().velocity(0, 4), 1.0);
        assert_eq!(s.pattern().velocity(0, 5), 0.0);
    }

    #[test]
    fn nearest_quantize_survives_a_tempo_change() {
        let config = EngineConfig {
            record_quantize: RecordQuantize::Nearest,
            ..EngineConfig::default()
        };
        let mut s = Sequencer::new(FakeEngine::with_ready(&[1]), &config);
        s.assign_sample(0, SampleId(1));
        s.toggle_recording();
        s.toggle_play();
        run_for(&mut s, 0.55);
        s.set_bpm(60);
        // step 4 sounded at 0.5s, step 5 is queued for 0.625s
        s.trigger_pad_manual(0);
        assert_eq!(s.pattern().velocity(0, 4), 1.0);
        assert_eq!(s.pattern().velocity(0, 5), 0.0);
    }

    #[test]
    fn manual_voice_is_exclusive() {
        let mut s = seq();
        let a = s.trigger_pad_manual(0).unwrap();
        let b = s.trigger_pad_manual(1).unwrap();
        assert_eq!(s.engine().stopped, vec![a]);
        let live = s.engine().live_voices();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].handle, b);
    }

    #[test]
    fn release_and_clear_pad() {
        let mut s = seq();
        let a = s.trigger_pad_manual(0).unwrap();
        s.release_pad();
        assert_eq!(s.engine().stopped, vec![a]);

        let b = s.trigger_pad_manual(1).unwrap();
        s.clear_pad(0); // not the live one
        assert_eq!(s.engine().stopped, vec![a]);
        s.clear_pad(1);
        assert_eq!(s.engine().stopped, vec![a, b]);
        assert!(s.pads().get(1).unwrap().sample.is_none());
        assert!(s.trigger_pad_manual(1).is_none());
    }

    #[test]
    fn tap_tempo_feeds_bpm() {
        let mut s = seq();
        let t0 = Instant::now();
        assert_eq!(s.tap_tempo(t0), None);
        assert_eq!(s.tap_tempo(t0 + Duration::from_millis(500)), Some(120));
        assert_eq!(s.tap_tempo(t0 + Duration::from_millis(800)), Some(150));
        assert_eq!(s.state().bpm, 150);
    }

    #[test]
    fn bpm_change_reaches_the_next_step() {
        let mut s = seq();
        for step in 0..16 {
            s.set_velocity(0, step, 1.0);
        }
        s.toggle_play();
        s.set_bpm(60);
        run_for(&mut s, 0.1);
        // step 1 still at the old spacing, step 2 a 60 bpm step later
        run_for(&mut s, 0.3);
        let starts: Vec<f64> = s.engine().voices.iter().map(|v| v.start).collect();
        assert_eq!(starts, vec![0.0, 0.125, 0.375]);
    }

    #[test]
    fn pointer_down_follows_edit_mode() {
        let mut s = seq();
        s.pointer_down(3, 3, 0.0);
        s.drag_paint_enter(3, 4);
        s.end_drag();
        assert_eq!(s.pattern().velocity(3, 3), 1.0);
        assert_eq!(s.pattern().velocity(3, 4), 1.0);

        s.set_edit_mode(EditMode::Velocity);
        s.pointer_down(3, 3, 100.0);
        s.velocity_drag(150.0);
        s.end_drag();
        assert!((s.pattern().velocity(3, 3) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn presets_load_by_index() {
        let mut s = seq();
        s.set_velocity(9, 9, 1.0);
        assert_eq!(s.load_preset_index(0), Some("Four on the Floor"));
        assert_eq!(s.pattern().velocity(9, 9), 0.0);
        assert_eq!(s.pattern().velocity(0, 4), 1.0);
        assert_eq!(s.load_preset_index(999), None);
    }

    #[test]
    fn finished_preview_is_forgotten_while_idle() {
        let mut s = seq();
        let a = s.trigger_pad_manual(0).unwrap();
        s.poll(Instant::now());
        assert_eq!(s.manual_voice().map(|v| v.handle), Some(a));

        s.engine_mut().finish(a);
        s.poll(Instant::now());
        assert!(s.manual_voice().is_none());
        // nothing left to cut on release
        s.release_pad();
        assert!(s.engine().stopped.is_empty());
    }

    #[test]
    fn shutdown_stops_everything() {
        let mut s = seq();
        s.toggle_play();
        let a = s.trigger_pad_manual(0).unwrap();
        s.shutdown();
        assert_eq!(s.state().transport, Transport::Idle);
        assert!(s.engine().stopped.contains(&a));
        assert!(s.manual_voice().is_none());
        assert!(s.time_until_tick(Instant::now()).is_none());
    }
}
