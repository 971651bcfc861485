// The step matrix and every way it gets edited.
//
// Cells hold a velocity: 0.0 is "off", anything in (0, 1] is a gain multiplier
// applied on top of the pad volume when the step fires. All writes go through
// here so the [0, 1] invariant holds no matter who is editing.

use crate::shared::{NUM_PADS, STEPS_PER_PATTERN};
use super::presets::PresetPattern;

pub const MIN_DRAG_VELOCITY: f32 = 0.05;

// screen units of vertical drag per full velocity unit
const DRAG_UNITS_PER_VELOCITY: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    // grid mode: every cell entered gets the value the first cell was toggled to
    Paint { value: f32 },
    // velocity mode: one cell, value follows the pointer
    Velocity { pad: usize, step: usize, start_y: f32, start_value: f32 },
}

#[derive(Clone, Debug)]
pub struct StepMatrix {
    cells: [[f32; STEPS_PER_PATTERN]; NUM_PADS],
    drag: Option<Drag>,
}

impl Default for StepMatrix {
    fn default() -> Self {
        Self {
            cells: [[0.0; STEPS_PER_PATTERN]; NUM_PADS],
            drag: None,
        }
    }
}

fn in_range(pad: usize, step: usize) -> bool {
    pad < NUM_PADS && step < STEPS_PER_PATTERN
}

fn clamp_velocity(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

impl StepMatrix {
    pub fn velocity(&self, pad: usize, step: usize) -> f32 {
        if !in_range(pad, step) {
            return 0.0;
        }
        self.cells[pad][step]
    }

    pub fn row(&self, pad: usize) -> Option<&[f32; STEPS_PER_PATTERN]> {
        self.cells.get(pad)
    }

    /// Pads with a non-zero velocity on `step`, in pad order.
    pub fn active_at(&self, step: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(pad, row)| {
            row.get(step).copied().filter(|v| *v > 0.0).map(|v| (pad, v))
        })
    }

    pub fn set_velocity(&mut self, pad: usize, step: usize, value: f32) {
        if !in_range(pad, step) {
            return;
        }
        self.cells[pad][step] = clamp_velocity(value);
    }

    // Grid mode pointer-down. Returns the value the cell was toggled to.
    pub fn paint_step(&mut self, pad: usize, step: usize) -> Option<f32> {
        if !in_range(pad, step) {
            return None;
        }
        let value = if self.cells[pad][step] > 0.0 { 0.0 } else { 1.0 };
        self.cells[pad][step] = value;
        self.drag = Some(Drag::Paint { value });
        Some(value)
    }

    pub fn drag_paint_enter(&mut self, pad: usize, step: usize) {
        if let Some(Drag::Paint { value }) = self.drag {
            if in_range(pad, step) {
                self.cells[pad][step] = value;
            }
        }
    }

    // Velocity mode pointer-down. An empty cell is switched on at full
    // velocity; an active one starts a vertical drag from `y`.
    pub fn velocity_press(&mut self, pad: usize, step: usize, y: f32) {
        if !in_range(pad, step) {
            return;
        }
        let current = self.cells[pad][step];
        if current > 0.0 {
            self.drag = Some(Drag::Velocity { pad, step, start_y: y, start_value: current });
        } else {
            self.cells[pad][step] = 1.0;
            self.drag = None;
        }
    }

    // Screen y grows downward, so dragging up raises the velocity.
    pub fn velocity_drag(&mut self, y: f32) {
        if let Some(Drag::Velocity { pad, step, start_y, start_value }) = self.drag {
            let delta = (start_y - y) / DRAG_UNITS_PER_VELOCITY;
            let value = start_value + delta;
            self.cells[pad][step] = if value.is_nan() {
                start_value
            } else {
                value.clamp(MIN_DRAG_VELOCITY, 1.0)
            };
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // Overdub write: first hit wins, an existing velocity is left alone.
    pub fn record_hit(&mut self, pad: usize, step: usize) -> bool {
        if !in_range(pad, step) || self.cells[pad][step] > 0.0 {
            return false;
        }
        self.cells[pad][step] = 1.0;
        true
    }

    pub fn load_preset(&mut self, preset: &PresetPattern) {
        self.clear_all();
        for (&pad, steps) in &preset.steps_by_pad {
            for &step in steps {
                // out of range entries in a preset are skipped
                if in_range(pad, step) {
                    self.cells[pad][step] = 1.0;
                }
            }
        }
    }

    pub fn clear_pad(&mut self, pad: usize) {
        if let Some(row) = self.cells.get_mut(pad) {
            *row = [0.0; STEPS_PER_PATTERN];
        }
        // a velocity drag on this row would write the cell straight back
        if matches!(self.drag, Some(Drag::Velocity { pad: p, .. }) if p == pad) {
            self.drag = None;
        }
    }

    pub fn clear_all(&mut self) {
        self.cells = [[0.0; STEPS_PER_PATTERN]; NUM_PADS];
        self.drag = None;
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.cells.iter().flatten().filter(|v| **v > 0.0).count()
    }
}
