use crate::shared::NUM_PADS;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

const COLS: usize = 4;
const ROWS: usize = 4;

// One key of the 4x4 grid. `level` is a step velocity in write mode and
// 0/1 otherwise; `lit` marks the playhead or the selected pad.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    pub level: f32,
    pub lit: bool,
}

pub fn draw_pad_grid(frame: &mut Frame, area: Rect, labels: &[&str; NUM_PADS], cells: &[Cell; NUM_PADS]) {
    let row_constraints = [Constraint::Percentage(25); ROWS];
    let col_constraints = [Constraint::Percentage(25); COLS];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (row_idx, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(*row_area);

        for (col_idx, cell_area) in cols.iter().enumerate() {
            let idx = row_idx * COLS + col_idx;
            let cell = cells[idx];
            let style = cell_style(cell);
            let text = if cell.level > 0.0 {
                format!("{} {:>3}", labels[idx], (cell.level * 100.0).round() as u32)
            } else {
                labels[idx].to_string()
            };
            let block = Block::default().borders(Borders::ALL).border_style(style);
            let widget = Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(style)
                .block(block);
            frame.render_widget(widget, *cell_area);
        }
    }
}

fn cell_style(cell: Cell) -> Style {
    let base = if cell.level >= 0.66 {
        Style::default().fg(Color::White).bg(Color::Magenta)
    } else if cell.level > 0.0 {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    if cell.lit {
        base.fg(Color::LightYellow).add_modifier(Modifier::BOLD)
    } else {
        base
    }
}
