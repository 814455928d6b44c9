use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color as TermColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::display::{Cell, Color, Grid};
use crate::source::GridArea;

/// Where [`draw`] puts the grid: inside a one-cell border at the top-left
/// corner of the terminal.
pub fn grid_area(grid: &Grid) -> GridArea {
    GridArea {
        top: 1,
        left: 1,
        lines: grid.lines(),
        cols: grid.cols(),
    }
}

/// Render the grid with a status line and a help line under it.
pub fn draw(frame: &mut Frame, grid: &Grid, title: &str, status: &str, help: &str) {
    let width = grid.cols().saturating_add(2);
    let height = grid.lines().saturating_add(2);
    let full = frame.area();
    let area = Rect::new(full.x, full.y, width.min(full.width), full.height);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(height), // grid + border
            Constraint::Length(1),      // status bar
            Constraint::Length(1),      // help bar
            Constraint::Min(0),
        ])
        .split(area);

    // ── Grid ────────────────────────────────────────────────────
    let lines: Vec<Line> = grid.rows().iter().map(|row| styled_row(row)).collect();
    let grid_widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {title} "))
            .border_style(Style::default().fg(TermColor::DarkGray)),
    );
    frame.render_widget(grid_widget, chunks[0]);

    // ── Status bar ──────────────────────────────────────────────
    let status_bar = Paragraph::new(Line::from(Span::styled(
        format!(" {status}"),
        Style::default()
            .fg(TermColor::Black)
            .bg(TermColor::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(TermColor::Cyan));
    frame.render_widget(status_bar, chunks[1]);

    // ── Help bar ────────────────────────────────────────────────
    let help_bar = Paragraph::new(Line::from(Span::styled(
        format!(" {help}"),
        Style::default().fg(TermColor::DarkGray),
    )));
    frame.render_widget(help_bar, chunks[2]);
}

fn styled_row(row: &[Cell]) -> Line<'static> {
    let spans: Vec<Span> = row
        .iter()
        .map(|cell| {
            Span::styled(
                cell.ch.to_string(),
                Style::default()
                    .fg(term_color(cell.fg))
                    .bg(term_color(cell.bg))
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    Line::from(spans)
}

/// Map a palette colour to a terminal colour.
pub fn term_color(color: Color) -> TermColor {
    match color {
        Color::Black => TermColor::Black,
        Color::White => TermColor::White,
        Color::Red => TermColor::Red,
        Color::Green => TermColor::Green,
        Color::Blue => TermColor::Blue,
        Color::Yellow => TermColor::Yellow,
        Color::Magenta => TermColor::Magenta,
        Color::Orange => TermColor::Rgb(255, 200, 0),
        Color::Cyan => TermColor::Cyan,
        Color::Pink => TermColor::Rgb(255, 175, 175),
        Color::Brown => TermColor::Rgb(145, 88, 44),
        Color::DarkGray => TermColor::DarkGray,
        Color::Gray => TermColor::Gray,
        Color::LightGray => TermColor::Rgb(192, 192, 192),
    }
}
