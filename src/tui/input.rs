use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::mode::TuiState;
use crate::shared::InputEvent;

// poll for input from tui, tracks state of key presses/holds in tuistate,
// resolves key combos to sequences of input events for the middle layer
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(key.code, key.kind, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, kind: KeyEventKind, ts: &mut TuiState) -> Vec<InputEvent> {
    // releases only come through on terminals with keyboard enhancement
    if kind == KeyEventKind::Release {
        return handle_release(code, ts);
    }
    if kind == KeyEventKind::Repeat {
        return vec![];
    }

    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::TogglePlay],

        // any keys on the 4x4 grid pad
        KeyCode::Char(c @ ('1' | '2' | '3' | '4'
            | 'q' | 'w' | 'e' | 'r'
            | 'a' | 's' | 'd' | 'f'
            | 'z' | 'x' | 'c' | 'v')) => {
            if let Some(n) = char_to_pad(c) {
                resolve_grid(n, ts)
            } else {
                vec![]
            }
        }

        // lowercase = down and shifted = up, for terminals without releases
        KeyCode::Char('g') => { ts.select_held = true; vec![] }
        KeyCode::Char('G') => { ts.select_held = false; vec![] }

        KeyCode::Char('b') => vec![InputEvent::ToggleRecord],
        KeyCode::Char('m') => vec![InputEvent::ToggleMetronome],
        KeyCode::Char('l') => vec![InputEvent::ToggleLooping],
        KeyCode::Char('k') => vec![InputEvent::CycleCountIn],
        KeyCode::Char('n') => vec![InputEvent::TapTempo],
        KeyCode::Char('-') => vec![InputEvent::NudgeBpm(-1)],
        KeyCode::Char('=') => vec![InputEvent::NudgeBpm(1)],
        KeyCode::Char('_') => vec![InputEvent::NudgeBpm(-10)],
        KeyCode::Char('+') => vec![InputEvent::NudgeBpm(10)],
        KeyCode::Char('t') => vec![InputEvent::ToggleWriteMode],
        KeyCode::Char('u') => vec![InputEvent::ToggleEditMode],
        KeyCode::Char('p') => vec![InputEvent::NextPreset],
        KeyCode::Char('0') => vec![InputEvent::ClearSelectedPad],
        KeyCode::Char(')') => vec![InputEvent::ClearAll],

        // screen y grows downward, so [ drags down and lowers velocity
        KeyCode::Char('[') => vec![InputEvent::VelocityNudge(5.0)],
        KeyCode::Char(']') => vec![InputEvent::VelocityNudge(-5.0)],

        _ => vec![],
    }
}

fn handle_release(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Char('g') => {
            ts.select_held = false;
            vec![]
        }
        KeyCode::Char(c) => match char_to_pad(c) {
            Some(n) if ts.pads_down[n as usize] => {
                ts.pads_down[n as usize] = false;
                vec![InputEvent::PadUp(n)]
            }
            _ => vec![],
        },
        _ => vec![],
    }
}

// resolve grid keypresses into semantic inputevents based on held state
fn resolve_grid(n: u8, ts: &mut TuiState) -> Vec<InputEvent> {
    if ts.select_held {
        return vec![InputEvent::SelectPad(n)];
    }
    ts.pads_down[n as usize] = true;
    vec![InputEvent::PadDown(n)]
}

// convert char to pad index
fn char_to_pad(c: char) -> Option<u8> {
    let idx = match c {
        '1' => 0, '2' => 1, '3' => 2, '4' => 3,
        'q' => 4, 'w' => 5, 'e' => 6, 'r' => 7,
        'a' => 8, 's' => 9, 'd' => 10, 'f' => 11,
        'z' => 12, 'x' => 13, 'c' => 14, 'v' => 15,
        _ => return None,
    };
    Some(idx)
}
