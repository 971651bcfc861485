use crate::shared::{DisplayState, NUM_PADS};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::grid::{draw_pad_grid, Cell};

const PAD_LABELS: [&str; 16] = [
   "1", "2", "3", "4",
   "Q", "W", "E", "R",
   "A", "S", "D", "F",
   "Z", "X", "C", "V",
];

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
   let sections = Layout::default()
       .direction(Direction::Vertical)
       .constraints([
           Constraint::Length(6), // lcd screen
           Constraint::Length(3), // mode flags row
           Constraint::Min(12), // pad grid
       ])
       .split(area);

   draw_screen(frame, sections[0], state);
   draw_mode_row(frame, sections[1], state, blink_on);
   draw_pad_grid(frame, sections[2], &PAD_LABELS, &grid_cells(state));
}

fn draw_screen(frame: &mut Frame, area: Rect, state: &DisplayState) {
   let step = match state.playing_step {
       Some(s) => format!("{:>2}/16", s + 1),
       None => "--/16".to_string(),
   };
   let count_in = match state.count_in_bars {
       0 => "off".to_string(),
       n => format!("{n} bar"),
   };
   let lines = vec![
       Line::from(vec![
           Span::styled(format!("{:>3} BPM", state.bpm), Style::default().add_modifier(Modifier::BOLD)),
           Span::raw(format!("  {:<5} {step}", state.transport)),
       ]),
       Line::from(format!(
           "pad {}  samples {}/{NUM_PADS}  {}",
           PAD_LABELS[state.selected_pad],
           state.pads_loaded,
           state.sounding_pad.map_or(String::new(), |p| format!("> {}", PAD_LABELS[p])),
       )),
       Line::from(format!("count-in {count_in}")),
       Line::from(state.display_text.clone()),
   ];
   let screen = Paragraph::new(lines)
       .style(Style::default().fg(Color::LightGreen))
       .block(Block::default().borders(Borders::ALL).title("padseq"));
   frame.render_widget(screen, area);
}

fn draw_mode_row(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
   let flag = |label: &'static str, on: bool, color: Color| {
       let style = if on {
           Style::default().fg(Color::Black).bg(color)
       } else {
           Style::default().fg(Color::DarkGray)
       };
       Span::styled(format!(" {label} "), style)
   };
   // record blinks while counting in
   let rec_on = state.recording && (state.transport != "COUNT" || blink_on);
   let row = Line::from(vec![
       flag("REC", rec_on, Color::Red),
       Span::raw(" "),
       flag("LOOP", state.looping, Color::Cyan),
       Span::raw(" "),
       flag("MET", state.metronome, Color::Yellow),
       Span::raw(" "),
       flag("WRITE", state.write_mode, Color::Magenta),
       Span::raw(" "),
       flag("VEL", state.velocity_mode, Color::Blue),
   ]);
   let widget = Paragraph::new(row).block(Block::default().borders(Borders::ALL));
   frame.render_widget(widget, area);
}

// In write mode the grid shows the selected pad's 16 steps, otherwise the
// pads themselves with the selected one lit.
fn grid_cells(state: &DisplayState) -> [Cell; NUM_PADS] {
   let mut cells = [Cell::default(); NUM_PADS];
   if state.write_mode {
       for (i, cell) in cells.iter_mut().enumerate() {
           cell.level = state.selected_row[i];
           cell.lit = state.playing_step == Some(i);
       }
       return cells;
   }
   let selected = &mut cells[state.selected_pad.min(NUM_PADS - 1)];
   selected.lit = true;
   // flash the selected pad when the playhead crosses one of its steps
   if let Some(step) = state.playing_step {
       selected.level = state.selected_row[step];
   }
   cells
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::shared::STEPS_PER_PATTERN;

   fn display() -> DisplayState {
       DisplayState {
           bpm: 120,
           transport: "PLAY",
           playing_step: Some(2),
           recording: false,
           looping: true,
           metronome: false,
           count_in_bars: 0,
           write_mode: true,
           velocity_mode: false,
           selected_pad: 1,
           selected_row: [0.0; STEPS_PER_PATTERN],
           pads_loaded: 4,
           sounding_pad: None,
           display_text: String::new(),
       }
   }

   #[test]
   fn write_mode_grid_shows_steps_and_playhead() {
       let mut ds = display();
       ds.selected_row[2] = 0.5;
       let cells = grid_cells(&ds);
       assert_eq!(cells[2], Cell { level: 0.5, lit: true });
       assert_eq!(cells[3], Cell::default());
   }

   #[test]
   fn pad_grid_lights_the_selected_pad() {
       let mut ds = display();
       ds.write_mode = false;
       let cells = grid_cells(&ds);
       assert!(cells[1].lit);
       assert!(!cells[0].lit);
       assert_eq!(cells[1].level, 0.0);

       ds.selected_row[2] = 1.0;
       assert_eq!(grid_cells(&ds)[1].level, 1.0);
   }
}
