use std::fmt;

/// A cell position in the character grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub line: u16,
    pub col: u16,
}

impl Location {
    pub fn new(line: u16, col: u16) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.col)
    }
}

/// Kind of mouse gesture reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseKind {
    /// Button pressed and released on the same cell.
    Click,
    Down,
    Up,
    /// Pointer moved to a new cell with a button held.
    Drag,
}

/// A mouse gesture at a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub at: Location,
}

impl MouseEvent {
    pub fn new(kind: MouseKind, line: u16, col: u16) -> Self {
        Self {
            kind,
            at: Location::new(line, col),
        }
    }
}

impl fmt::Display for MouseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.at)
    }
}

/// Outcome of [`InputCoordinator::poll_any_key`](crate::InputCoordinator::poll_any_key).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPoll {
    /// A key is held; carries its code.
    Key(u32),
    /// No key is held, but a mouse event is waiting.
    MousePending,
    /// Nothing arrived in time.
    NoKey,
}

impl KeyPoll {
    pub fn key(self) -> Option<u32> {
        match self {
            KeyPoll::Key(code) => Some(code),
            _ => None,
        }
    }
}
