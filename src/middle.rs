// The middle layer: turns front-end input events into sequencer calls and
// builds the display snapshot. Nothing here touches timing.

use std::time::Instant;

use crate::audio_api::AudioEngine;
use crate::sequencer::state::{EditMode, PlayMode, Transport};
use crate::sequencer::Sequencer;
use crate::shared::{DisplayState, InputEvent, NUM_PADS, STEPS_PER_PATTERN};

pub struct Middle<E: AudioEngine> {
    pub seq: Sequencer<E>,
    selected_pad: usize,
    write_mode: bool,
    next_preset: usize,
    drag_y: f32,
    display_text: String,
}

impl<E: AudioEngine> Middle<E> {
    pub fn new(seq: Sequencer<E>) -> Self {
        Self {
            seq,
            selected_pad: 0,
            write_mode: false,
            next_preset: 0,
            drag_y: 0.0,
            display_text: String::new(),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::PadDown(n) => self.pad_down(n as usize),
            InputEvent::PadUp(_) => {
                if self.seq.play_mode() == PlayMode::Hold && !self.write_mode {
                    self.seq.release_pad();
                }
            }
            InputEvent::SelectPad(n) => {
                if (n as usize) < NUM_PADS {
                    self.selected_pad = n as usize;
                }
            }
            InputEvent::TogglePlay => self.seq.toggle_play(),
            InputEvent::ToggleRecord => self.seq.toggle_recording(),
            InputEvent::ToggleMetronome => self.seq.toggle_metronome(),
            InputEvent::ToggleLooping => self.seq.toggle_looping(),
            InputEvent::CycleCountIn => self.seq.cycle_count_in(),
            InputEvent::TapTempo => {
                if let Some(bpm) = self.seq.tap_tempo(now) {
                    self.display_text = format!("TAP {bpm}");
                }
            }
            InputEvent::NudgeBpm(delta) => self.seq.nudge_bpm(delta as i64),
            InputEvent::ToggleWriteMode => {
                self.write_mode = !self.write_mode;
                self.seq.end_drag();
            }
            InputEvent::ToggleEditMode => {
                let mode = match self.seq.edit_mode() {
                    EditMode::Grid => EditMode::Velocity,
                    EditMode::Velocity => EditMode::Grid,
                };
                self.seq.set_edit_mode(mode);
            }
            InputEvent::VelocityNudge(dy) => {
                self.drag_y += dy;
                self.seq.velocity_drag(self.drag_y);
            }
            InputEvent::NextPreset => {
                let count = self.seq.presets().len();
                if count > 0 {
                    let index = self.next_preset % count;
                    if let Some(name) = self.seq.load_preset_index(index) {
                        self.display_text = name.to_string();
                    }
                    self.next_preset = index + 1;
                }
            }
            InputEvent::ClearSelectedPad => self.seq.clear_pad_steps(self.selected_pad),
            InputEvent::ClearAll => self.seq.clear_all(),
            InputEvent::Quit => self.seq.shutdown(),
        }
    }

    fn pad_down(&mut self, n: usize) {
        if !self.write_mode {
            self.seq.trigger_pad_manual(n);
            return;
        }
        // in write mode the 16 keys are the 16 steps of the selected pad
        match self.seq.edit_mode() {
            EditMode::Grid => {
                self.seq.pointer_down(self.selected_pad, n, 0.0);
                self.seq.end_drag();
            }
            EditMode::Velocity => {
                self.drag_y = 0.0;
                self.seq.pointer_down(self.selected_pad, n, 0.0);
            }
        }
    }

    pub fn display_state(&self) -> DisplayState {
        let state = self.seq.state();
        let mut selected_row = [0.0; STEPS_PER_PATTERN];
        if let Some(row) = self.seq.pattern().row(self.selected_pad) {
            selected_row = *row;
        }
        DisplayState {
            bpm: state.bpm,
            transport: match state.transport {
                Transport::Idle => "IDLE",
                Transport::CountingIn => "COUNT",
                Transport::Playing => "PLAY",
            },
            playing_step: state.current_step,
            recording: state.recording,
            looping: state.looping,
            metronome: state.metronome_on,
            count_in_bars: state.count_in.bars(),
            write_mode: self.write_mode,
            velocity_mode: self.seq.edit_mode() == EditMode::Velocity,
            selected_pad: self.selected_pad,
            selected_row,
            pads_loaded: self.seq.pads().assigned_count(),
            sounding_pad: self.seq.manual_voice().map(|v| v.pad),
            display_text: self.display_text.clone(),
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.seq.poll(now);
    }
}
