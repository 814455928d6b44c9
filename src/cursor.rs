use std::time::{Duration, Instant};

/// Blink state of the text cursor, advanced by wall-clock time.
///
/// The state only changes inside [`CursorBlink::tick`], which callers invoke
/// whenever they happen to be polling for input. A hidden cursor never
/// blinks.
#[derive(Debug, Clone)]
pub struct CursorBlink {
    period: Duration,
    visible: bool,
    lit: bool,
    next_toggle: Option<Instant>,
}

impl CursorBlink {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            visible: false,
            lit: false,
            next_toggle: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the cursor glyph is currently drawn.
    pub fn is_lit(&self) -> bool {
        self.visible && self.lit
    }

    /// Shows or hides the cursor. Returns whether the cursor cell needs a
    /// redraw, which is the case when hiding a lit cursor.
    ///
    /// Showing starts unlit with the toggle already due, so the next tick
    /// lights it.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        let was_lit = self.lit;
        self.lit = false;
        self.next_toggle = None;
        !visible && was_lit
    }

    /// Toggles the blink state if the period has elapsed since the last
    /// toggle. Returns whether the cursor cell must be redrawn.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.visible {
            return false;
        }
        if self.next_toggle.is_some_and(|due| now < due) {
            return false;
        }
        self.lit = !self.lit;
        self.next_toggle = Some(now + self.period);
        true
    }
}
