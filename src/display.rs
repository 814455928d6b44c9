use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::event::Location;

/// Glyph drawn over the cursor cell while the cursor is lit.
pub const CURSOR_GLYPH: char = '|';

/// The fixed console palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Orange,
    Cyan,
    Pink,
    Brown,
    DarkGray,
    Gray,
    LightGray,
}

impl Color {
    pub const ALL: [Color; 14] = [
        Color::Black,
        Color::White,
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Magenta,
        Color::Orange,
        Color::Cyan,
        Color::Pink,
        Color::Brown,
        Color::DarkGray,
        Color::Gray,
        Color::LightGray,
    ];

    /// Wraps around the palette, so any index is valid.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    /// A foreground that stays readable on `self` as background.
    pub fn contrast(self) -> Self {
        match self {
            Color::White | Color::Yellow | Color::LightGray | Color::Pink => Color::Black,
            _ => Color::White,
        }
    }
}

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    pub fn new(ch: char, fg: Color, bg: Color) -> Self {
        Self { ch, fg, bg }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(' ', Color::White, Color::Black)
    }
}

/// Where the input core sends echoed characters and cursor blinks.
///
/// Implementations are called from the event-source thread (echo) and the
/// polling thread (cursor), so they must be cheap and thread-safe.
pub trait DisplaySink: Send + Sync {
    fn set_cell(&self, at: Location, cell: Cell);

    /// `None` outside the grid.
    fn cell_char(&self, at: Location) -> Option<char>;

    /// Writes `c` at the sink's write position and advances it.
    fn put_char(&self, c: char);

    /// Draws or removes the cursor glyph at the write position.
    fn show_cursor(&self, lit: bool);
}

#[derive(Debug)]
struct GridState {
    cells: Vec<Cell>,
    pen: Location,
    fg: Color,
    bg: Color,
    cursor_lit: bool,
}

/// In-memory character grid with a write position ("pen").
///
/// The cursor glyph is an overlay: it shows up in [`Grid::rows`] but never
/// replaces the stored character under it.
#[derive(Debug)]
pub struct Grid {
    lines: u16,
    cols: u16,
    state: Mutex<GridState>,
}

impl Grid {
    /// `lines` and `cols` are clamped to at least 1.
    pub fn new(lines: u16, cols: u16) -> Self {
        let lines = lines.max(1);
        let cols = cols.max(1);
        Self {
            lines,
            cols,
            state: Mutex::new(GridState {
                cells: vec![Cell::default(); usize::from(lines) * usize::from(cols)],
                pen: Location::default(),
                fg: Color::White,
                bg: Color::Black,
                cursor_lit: false,
            }),
        }
    }

    pub fn lines(&self) -> u16 {
        self.lines
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn pen(&self) -> Location {
        self.lock().pen
    }

    /// Moves the write position, clamped to the grid.
    pub fn move_to(&self, line: u16, col: u16) {
        self.lock().pen = Location::new(line.min(self.lines - 1), col.min(self.cols - 1));
    }

    pub fn set_colors(&self, fg: Color, bg: Color) {
        let mut state = self.lock();
        state.fg = fg;
        state.bg = bg;
    }

    pub fn print(&self, text: &str) {
        let mut state = self.lock();
        for c in text.chars() {
            self.write(&mut state, c);
        }
    }

    /// Resets every cell to blank and the pen to the origin.
    pub fn clear(&self) {
        let mut state = self.lock();
        let blank = Cell::new(' ', state.fg, state.bg);
        state.cells.iter_mut().for_each(|cell| *cell = blank);
        state.pen = Location::default();
    }

    pub fn cell(&self, at: Location) -> Option<Cell> {
        let index = self.index(at)?;
        Some(self.lock().cells[index])
    }

    /// Rows of cells with the cursor glyph overlaid when lit.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        let state = self.lock();
        let mut rows: Vec<Vec<Cell>> = state
            .cells
            .chunks(usize::from(self.cols))
            .map(<[Cell]>::to_vec)
            .collect();
        if state.cursor_lit {
            let cell = &mut rows[usize::from(state.pen.line)][usize::from(state.pen.col)];
            cell.ch = CURSOR_GLYPH;
        }
        rows
    }

    fn write(&self, state: &mut GridState, c: char) {
        let mut pen = state.pen;
        if c == '\n' {
            pen.col = 0;
            pen.line = (pen.line + 1) % self.lines;
        } else {
            if let Some(index) = self.index(pen) {
                state.cells[index] = Cell::new(c, state.fg, state.bg);
            }
            pen.col += 1;
            if pen.col == self.cols {
                pen.col = 0;
                pen.line = (pen.line + 1) % self.lines;
            }
        }
        state.pen = pen;
    }

    fn index(&self, at: Location) -> Option<usize> {
        (at.line < self.lines && at.col < self.cols)
            .then(|| usize::from(at.line) * usize::from(self.cols) + usize::from(at.col))
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplaySink for Grid {
    fn set_cell(&self, at: Location, cell: Cell) {
        if let Some(index) = self.index(at) {
            self.lock().cells[index] = cell;
        }
    }

    fn cell_char(&self, at: Location) -> Option<char> {
        self.cell(at).map(|cell| cell.ch)
    }

    fn put_char(&self, c: char) {
        let mut state = self.lock();
        self.write(&mut state, c);
    }

    fn show_cursor(&self, lit: bool) {
        self.lock().cursor_lit = lit;
    }
}
