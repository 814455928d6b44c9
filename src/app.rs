use crate::display::{Cell, Color, DisplaySink, Grid};
use crate::event::{Location, MouseEvent, MouseKind};
use crate::keys;

/// What typed characters do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Letters are commands, the mouse paints.
    Paint,
    /// Characters are echoed at the pen, clicks move the pen.
    Type,
}

/// State of the paint demo, owned exclusively by the consumer thread.
///
/// Line 0 of the grid is the palette, the rest is canvas.
#[derive(Debug)]
pub struct App {
    /// Whether the app should exit on the next loop iteration.
    pub should_quit: bool,
    pub mode: Mode,
    /// Currently selected paint colour.
    pub color: Color,
    /// Key handled by the last poll, so a held key acts once.
    pub last_key: Option<u32>,
    /// Last input, shown in the status bar.
    pub last_event: String,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            mode: Mode::Paint,
            color: Color::Green,
            last_key: None,
            last_event: String::from("-"),
        }
    }

    /// Draw the palette row, marking the selected colour.
    pub fn draw_palette(&self, grid: &Grid) {
        for (index, color) in Color::ALL.iter().enumerate().take(usize::from(grid.cols())) {
            let mark = if *color == self.color { '*' } else { ' ' };
            grid.set_cell(
                Location::new(0, index as u16),
                Cell::new(mark, color.contrast(), *color),
            );
        }
    }

    pub fn select_color(&mut self, grid: &Grid, color: Color) {
        self.color = color;
        self.draw_palette(grid);
    }

    /// React to a held key. Repeats of the same key are ignored until a
    /// different key (or none) is seen.
    pub fn handle_key(&mut self, grid: &Grid, code: u32) {
        if self.last_key == Some(code) {
            return;
        }
        self.last_key = Some(code);
        self.last_event = format!("key {code}");
        match code {
            keys::ESCAPE => self.should_quit = true,
            keys::RIGHT => self.select_color(grid, Color::from_index(self.color.index() + 1)),
            keys::LEFT => {
                let count = Color::ALL.len();
                self.select_color(grid, Color::from_index(self.color.index() + count - 1));
            }
            _ => {}
        }
    }

    pub fn key_released(&mut self) {
        self.last_key = None;
    }

    /// React to a typed character. Returns whether the mode
    /// changed.
    pub fn handle_char(&mut self, grid: &Grid, c: char) -> bool {
        if c == '\t' {
            self.mode = match self.mode {
                Mode::Paint => Mode::Type,
                Mode::Type => Mode::Paint,
            };
            return true;
        }
        match self.mode {
            Mode::Paint => match c {
                'c' | 'C' => self.clear_canvas(grid),
                d @ '0'..='9' => {
                    let index = d.to_digit(10).unwrap_or(0) as usize;
                    self.select_color(grid, Color::from_index(index));
                }
                _ => {}
            },
            // Printable characters were already echoed by the input core.
            Mode::Type if c == '\u{8}' => erase_before_pen(grid),
            Mode::Type => {}
        }
        false
    }

    pub fn handle_mouse(&mut self, grid: &Grid, ev: MouseEvent) {
        self.last_event = ev.to_string();
        let at = ev.at;
        if at.line == 0 {
            if ev.kind == MouseKind::Down && usize::from(at.col) < Color::ALL.len() {
                self.select_color(grid, Color::from_index(usize::from(at.col)));
            }
            return;
        }
        match (self.mode, ev.kind) {
            (Mode::Paint, MouseKind::Down | MouseKind::Drag) => {
                grid.set_cell(at, Cell::new(' ', self.color.contrast(), self.color));
            }
            (Mode::Type, MouseKind::Click) => grid.move_to(at.line, at.col),
            _ => {}
        }
    }

    pub fn clear_canvas(&self, grid: &Grid) {
        for line in 1..grid.lines() {
            for col in 0..grid.cols() {
                grid.set_cell(Location::new(line, col), Cell::default());
            }
        }
    }

    pub fn help(&self) -> &'static str {
        match self.mode {
            Mode::Paint => "Esc: quit | ←/→ or 0-9: colour | drag: paint | c: clear | Tab: type",
            Mode::Type => "Esc: quit | type to write | click: move pen | Tab: paint",
        }
    }
}

/// Move the pen one cell back and blank it.
fn erase_before_pen(grid: &Grid) {
    let pen = grid.pen();
    if pen.col == 0 {
        return;
    }
    let at = Location::new(pen.line, pen.col - 1);
    grid.set_cell(at, Cell::default());
    grid.move_to(at.line, at.col);
}
