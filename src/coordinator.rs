use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{ConsoleConfig, MouseMode, Throttle};
use crate::cursor::CursorBlink;
use crate::display::DisplaySink;
use crate::error::ConfigError;
use crate::event::{KeyPoll, Location, MouseEvent, MouseKind};
use crate::key_set::KeySet;
use crate::ring::{Overflow, RingBuffer};

/// Lifecycle of an input session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// No event source attached yet. Notifications are dropped; polls
    /// behave normally and simply find nothing.
    Idle,
    Active,
    /// Detached for good. Notifications are dropped and polls return
    /// immediately with nothing.
    Closed,
}

impl Session {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Session::Idle,
            1 => Session::Active,
            _ => Session::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Session::Idle => 0,
            Session::Active => 1,
            Session::Closed => 2,
        }
    }
}

/// Bridges an asynchronous event source and a synchronous polling consumer.
///
/// The event source calls the `on_*` methods; they never wait beyond a
/// short lock hold. The consumer calls the `poll_*` methods, which block up
/// to a timeout, optionally throttled so that a busy polling loop cannot
/// spin faster than the configured minimum interval. Every poll also
/// advances the cursor blink.
///
/// Share it between the two threads with an `Arc`.
pub struct InputCoordinator {
    session: AtomicU8,
    typed: RingBuffer<char>,
    pressed: KeySet,
    mouse: RingBuffer<MouseEvent>,
    mouse_mode: Mutex<MouseMode>,
    last_drag: Mutex<Option<Location>>,
    echo: AtomicBool,
    throttle: Mutex<Throttle>,
    cursor: Mutex<CursorBlink>,
    sink: Option<Arc<dyn DisplaySink>>,
}

impl fmt::Debug for InputCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputCoordinator")
            .field("session", &self.session())
            .field("typed", &self.typed.len())
            .field("pressed", &self.pressed.len())
            .field("mouse", &self.mouse.len())
            .field("throttle", &self.throttle())
            .finish_non_exhaustive()
    }
}

impl InputCoordinator {
    /// Builds an idle coordinator with empty buffers.
    pub fn new(config: ConsoleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let typed = RingBuffer::new(config.char_capacity, Overflow::DropIncoming)?;
        let pressed = KeySet::new(config.pressed_capacity)?;
        let mouse = RingBuffer::new(config.mouse_capacity, Overflow::EvictOldest)?;
        let cursor = CursorBlink::new(config.blink_period);
        log::debug!(
            "input buffers: chars {} ({:?}), keys {}, mouse {} ({:?}), blink {:?}",
            typed.capacity(),
            typed.overflow(),
            pressed.capacity(),
            mouse.capacity(),
            mouse.overflow(),
            cursor.period(),
        );
        Ok(Self {
            session: AtomicU8::new(Session::Idle.as_u8()),
            typed,
            pressed,
            mouse,
            mouse_mode: Mutex::new(config.mouse),
            last_drag: Mutex::new(None),
            echo: AtomicBool::new(config.echo),
            throttle: Mutex::new(config.throttle),
            cursor: Mutex::new(cursor),
            sink: None,
        })
    }

    /// Routes echoed characters and cursor blinks to `sink`.
    pub fn with_display(mut self, sink: Arc<dyn DisplaySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    // ── Session ─────────────────────────────────────────────────

    pub fn session(&self) -> Session {
        Session::from_u8(self.session.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.session() == Session::Active
    }

    /// Starts accepting notifications. Only an idle session can attach.
    pub fn attach(&self) -> bool {
        let attached = self
            .session
            .compare_exchange(
                Session::Idle.as_u8(),
                Session::Active.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if attached {
            log::info!("input session attached");
        } else {
            log::debug!("attach ignored, session is {:?}", self.session());
        }
        attached
    }

    /// Closes the session and discards buffered input. Blocked polls run out
    /// their timeout; later polls return immediately.
    pub fn detach(&self) {
        let previous = Session::from_u8(self.session.swap(Session::Closed.as_u8(), Ordering::AcqRel));
        if previous == Session::Closed {
            return;
        }
        self.clear_input();
        self.set_cursor_visible(false);
        log::info!("input session closed");
    }

    // ── Event source side ───────────────────────────────────────

    pub fn on_char_typed(&self, c: char) {
        if !self.accepting("char") {
            return;
        }
        if self.is_echo() && is_printable(c) {
            if let Some(sink) = &self.sink {
                sink.put_char(c);
            }
        }
        if !self.typed.push(c) {
            log::debug!("character buffer full, dropped {c:?}");
        }
    }

    pub fn on_key_down(&self, code: u32) {
        if !self.accepting("key down") {
            return;
        }
        if !self.pressed.add(code) {
            log::debug!("pressed-key set full, ignored key {code}");
        }
    }

    pub fn on_key_up(&self, code: u32) {
        if !self.accepting("key up") {
            return;
        }
        self.pressed.remove(code);
    }

    /// Buffers a mouse gesture, subject to the mouse mode. A drag to the
    /// same cell as the previous drag is suppressed.
    pub fn on_mouse_event(&self, kind: MouseKind, line: u16, col: u16) {
        if !self.accepting("mouse") {
            return;
        }
        match (self.mouse_mode(), kind) {
            (MouseMode::Off, _) | (MouseMode::Buttons, MouseKind::Drag) => {
                log::trace!("mouse {kind:?} ignored by mouse mode");
                return;
            }
            _ => {}
        }
        if kind == MouseKind::Drag {
            let at = Location::new(line, col);
            let mut last = lock(&self.last_drag);
            if *last == Some(at) {
                return;
            }
            *last = Some(at);
        }
        self.mouse.push(MouseEvent::new(kind, line, col));
    }

    // ── Consumer side ───────────────────────────────────────────

    /// Next typed character, waiting up to `timeout`.
    pub fn poll_char(&self, timeout: Duration) -> Option<char> {
        if self.session() == Session::Closed {
            return None;
        }
        let c = self.typed.pop(timeout);
        self.blink_cursor();
        c
    }

    /// A currently held key, or a hint that the mouse has input instead.
    ///
    /// With throttling on, waits up to the larger of `timeout` and the
    /// minimum interval for a key, and never returns sooner than the minimum
    /// interval after the call started, even if a key was already held.
    /// Without throttling, waits up to `timeout`.
    pub fn poll_any_key(&self, timeout: Duration) -> KeyPoll {
        if self.session() == Session::Closed {
            return KeyPoll::NoKey;
        }
        let key = self.throttled(timeout, |wait| self.pressed.get_any(wait));
        self.blink_cursor();
        match key {
            Some(code) => KeyPoll::Key(code),
            None if self.mouse_pending() => KeyPoll::MousePending,
            None => KeyPoll::NoKey,
        }
    }

    /// Next mouse event, with the same throttling as [`Self::poll_any_key`].
    /// Always `None` while mouse input is off.
    pub fn poll_mouse_event(&self, timeout: Duration) -> Option<MouseEvent> {
        if self.session() == Session::Closed || self.mouse_mode() == MouseMode::Off {
            return None;
        }
        let event = self.throttled(timeout, |wait| self.mouse.pop(wait));
        self.blink_cursor();
        event
    }

    pub fn is_key_down(&self, code: u32) -> bool {
        self.pressed.contains(code)
    }

    pub fn any_key_down(&self) -> bool {
        !self.pressed.is_empty()
    }

    pub fn has_typed_chars(&self) -> bool {
        !self.typed.is_empty()
    }

    pub fn mouse_pending(&self) -> bool {
        self.mouse_mode() != MouseMode::Off && !self.mouse.is_empty()
    }

    /// Advances the blink state to `now`, drawing through the display sink
    /// when one is attached. Returns whether the cursor cell changed.
    pub fn tick_cursor_blink(&self, now: Instant) -> bool {
        let (redraw, lit) = {
            let mut cursor = lock(&self.cursor);
            (cursor.tick(now), cursor.is_lit())
        };
        if redraw {
            self.draw_cursor(lit);
        }
        redraw
    }

    // ── Settings ────────────────────────────────────────────────

    pub fn set_cursor_visible(&self, visible: bool) {
        let (redraw, lit) = {
            let mut cursor = lock(&self.cursor);
            let hidden_lit = cursor.set_visible(visible);
            let lit_now = visible && cursor.tick(Instant::now());
            (hidden_lit || lit_now, cursor.is_lit())
        };
        if redraw {
            self.draw_cursor(lit);
        }
    }

    pub fn is_cursor_visible(&self) -> bool {
        lock(&self.cursor).is_visible()
    }

    pub fn set_echo(&self, on: bool) {
        self.echo.store(on, Ordering::Relaxed);
    }

    pub fn is_echo(&self) -> bool {
        self.echo.load(Ordering::Relaxed)
    }

    /// Turns mouse input on, with drags only if `drag`. Drag suppression
    /// starts afresh.
    pub fn enable_mouse(&self, drag: bool) {
        *lock(&self.mouse_mode) = MouseMode::from_flags(true, drag);
        *lock(&self.last_drag) = None;
    }

    /// Turns mouse input off and discards buffered mouse events.
    pub fn disable_mouse(&self) {
        *lock(&self.mouse_mode) = MouseMode::Off;
        self.mouse.clear();
        *lock(&self.last_drag) = None;
    }

    pub fn mouse_mode(&self) -> MouseMode {
        *lock(&self.mouse_mode)
    }

    pub fn set_throttle(&self, throttle: Throttle) -> Result<(), ConfigError> {
        throttle.validate()?;
        *lock(&self.throttle) = throttle;
        Ok(())
    }

    pub fn throttle(&self) -> Throttle {
        *lock(&self.throttle)
    }

    /// Discards typed characters, held keys and mouse events.
    pub fn clear_input(&self) {
        self.typed.clear();
        self.pressed.clear();
        self.mouse.clear();
        *lock(&self.last_drag) = None;
    }

    pub(crate) fn discard_typed_and_mouse(&self) {
        self.typed.clear();
        self.mouse.clear();
    }

    // ── Internals ───────────────────────────────────────────────

    fn accepting(&self, what: &str) -> bool {
        let active = self.is_active();
        if !active {
            log::trace!("{what} notification dropped, session is {:?}", self.session());
        }
        active
    }

    fn throttled<T>(&self, timeout: Duration, wait: impl FnOnce(Duration) -> Option<T>) -> Option<T> {
        let throttle = self.throttle();
        if !throttle.enabled {
            return wait(timeout);
        }
        let started = Instant::now();
        let found = wait(timeout.max(throttle.min_interval));
        sleep_remainder(started, throttle.min_interval);
        found
    }

    fn blink_cursor(&self) {
        self.tick_cursor_blink(Instant::now());
    }

    fn draw_cursor(&self, lit: bool) {
        if let Some(sink) = &self.sink {
            sink.show_cursor(lit);
        }
    }
}

fn sleep_remainder(started: Instant, total: Duration) {
    let elapsed = started.elapsed();
    if elapsed < total {
        thread::sleep(total - elapsed);
    }
}

fn is_printable(c: char) -> bool {
    c == '\n' || !c.is_control()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Grid;

    fn unthrottled() -> ConsoleConfig {
        ConsoleConfig {
            throttle: Throttle::disabled(),
            mouse: MouseMode::ButtonsAndDrag,
            ..ConsoleConfig::default()
        }
    }

    fn active(config: ConsoleConfig) -> InputCoordinator {
        let input = InputCoordinator::new(config).unwrap();
        assert!(input.attach());
        input
    }

    #[test]
    fn idle_session_drops_notifications() {
        let input = InputCoordinator::new(unthrottled()).unwrap();
        input.on_char_typed('a');
        input.on_key_down(65);
        input.on_mouse_event(MouseKind::Click, 1, 1);
        assert_eq!(input.poll_char(Duration::ZERO), None);
        assert!(!input.any_key_down());
        assert_eq!(input.poll_mouse_event(Duration::ZERO), None);
    }

    #[test]
    fn closed_session_cannot_reattach() {
        let input = active(unthrottled());
        input.detach();
        assert_eq!(input.session(), Session::Closed);
        assert!(!input.attach());
        input.on_char_typed('z');
        assert_eq!(input.poll_char(Duration::from_secs(5)), None);
    }

    #[test]
    fn detach_discards_buffered_input() {
        let input = active(unthrottled());
        input.on_char_typed('q');
        input.on_key_down(81);
        input.detach();
        assert!(!input.has_typed_chars());
        assert!(!input.any_key_down());
        assert_eq!(input.poll_any_key(Duration::from_secs(5)), KeyPoll::NoKey);
    }

    #[test]
    fn typed_chars_come_back_in_order() {
        let input = active(unthrottled());
        for c in "hi!".chars() {
            input.on_char_typed(c);
        }
        assert_eq!(input.poll_char(Duration::ZERO), Some('h'));
        assert_eq!(input.poll_char(Duration::ZERO), Some('i'));
        assert_eq!(input.poll_char(Duration::ZERO), Some('!'));
        assert_eq!(input.poll_char(Duration::ZERO), None);
    }

    #[test]
    fn full_char_buffer_drops_newest() {
        let input = active(ConsoleConfig {
            char_capacity: 2,
            ..unthrottled()
        });
        input.on_char_typed('a');
        input.on_char_typed('b');
        input.on_char_typed('c');
        assert_eq!(input.poll_char(Duration::ZERO), Some('a'));
        assert_eq!(input.poll_char(Duration::ZERO), Some('b'));
        assert_eq!(input.poll_char(Duration::ZERO), None);
    }

    #[test]
    fn key_down_and_up_track_held_keys() {
        let input = active(unthrottled());
        input.on_key_down(37);
        assert!(input.is_key_down(37));
        assert!(input.any_key_down());
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::Key(37));
        input.on_key_up(37);
        assert!(!input.is_key_down(37));
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::NoKey);
    }

    #[test]
    fn pressed_set_overflow_is_silent() {
        let input = active(ConsoleConfig {
            pressed_capacity: 1,
            ..unthrottled()
        });
        input.on_key_down(1);
        input.on_key_down(2);
        assert!(input.is_key_down(1));
        assert!(!input.is_key_down(2));
    }

    #[test]
    fn mouse_pending_when_no_key_is_held() {
        let input = active(unthrottled());
        input.on_mouse_event(MouseKind::Down, 2, 3);
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::MousePending);
        input.on_key_down(32);
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::Key(32));
        assert_eq!(
            input.poll_mouse_event(Duration::ZERO),
            Some(MouseEvent::new(MouseKind::Down, 2, 3))
        );
    }

    #[test]
    fn repeated_drag_to_same_cell_collapses() {
        let input = active(unthrottled());
        input.on_mouse_event(MouseKind::Drag, 4, 4);
        input.on_mouse_event(MouseKind::Drag, 4, 4);
        input.on_mouse_event(MouseKind::Drag, 4, 5);
        assert_eq!(
            input.poll_mouse_event(Duration::ZERO),
            Some(MouseEvent::new(MouseKind::Drag, 4, 4))
        );
        assert_eq!(
            input.poll_mouse_event(Duration::ZERO),
            Some(MouseEvent::new(MouseKind::Drag, 4, 5))
        );
        assert_eq!(input.poll_mouse_event(Duration::ZERO), None);
    }

    #[test]
    fn buttons_between_drags_do_not_reset_suppression() {
        let input = active(unthrottled());
        input.on_mouse_event(MouseKind::Drag, 1, 1);
        input.on_mouse_event(MouseKind::Up, 1, 1);
        input.on_mouse_event(MouseKind::Drag, 1, 1);
        let kinds: Vec<MouseKind> = std::iter::from_fn(|| input.poll_mouse_event(Duration::ZERO))
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(kinds, vec![MouseKind::Drag, MouseKind::Up]);
    }

    #[test]
    fn mouse_mode_filters_events() {
        let input = active(ConsoleConfig {
            mouse: MouseMode::Buttons,
            ..unthrottled()
        });
        input.on_mouse_event(MouseKind::Drag, 0, 0);
        assert!(!input.mouse_pending());
        input.on_mouse_event(MouseKind::Click, 0, 0);
        assert!(input.mouse_pending());

        input.disable_mouse();
        assert!(!input.mouse_pending());
        input.on_mouse_event(MouseKind::Click, 0, 0);
        assert_eq!(input.poll_mouse_event(Duration::from_secs(5)), None);
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::NoKey);
    }

    #[test]
    fn enable_mouse_turns_drags_back_on() {
        let input = active(ConsoleConfig {
            mouse: MouseMode::Off,
            ..unthrottled()
        });
        input.on_mouse_event(MouseKind::Down, 1, 1);
        assert!(!input.mouse_pending());

        input.enable_mouse(true);
        assert_eq!(input.mouse_mode(), MouseMode::ButtonsAndDrag);
        input.on_mouse_event(MouseKind::Drag, 1, 2);
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::MousePending);
        assert_eq!(
            input.poll_mouse_event(Duration::ZERO),
            Some(MouseEvent::new(MouseKind::Drag, 1, 2))
        );
    }

    #[test]
    fn full_mouse_buffer_keeps_the_newest() {
        let input = active(ConsoleConfig {
            mouse_capacity: 2,
            ..unthrottled()
        });
        for col in 0..4 {
            input.on_mouse_event(MouseKind::Click, 0, col);
        }
        let cols: Vec<u16> = std::iter::from_fn(|| input.poll_mouse_event(Duration::ZERO))
            .map(|ev| ev.at.col)
            .collect();
        assert_eq!(cols, vec![2, 3]);
    }

    #[test]
    fn throttled_poll_takes_at_least_the_minimum_interval() {
        let input = active(ConsoleConfig {
            throttle: Throttle::new(Duration::from_millis(30)),
            ..unthrottled()
        });
        input.on_key_down(10);
        let start = Instant::now();
        assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::Key(10));
        assert!(start.elapsed() >= Duration::from_millis(30));

        let start = Instant::now();
        input.on_mouse_event(MouseKind::Up, 0, 0);
        assert!(input.poll_mouse_event(Duration::ZERO).is_some());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn set_throttle_validates() {
        let input = active(unthrottled());
        assert_eq!(
            input.set_throttle(Throttle::new(Duration::ZERO)),
            Err(ConfigError::ZeroPollInterval)
        );
        assert!(!input.throttle().enabled);
        input.set_throttle(Throttle::new(Duration::from_millis(5))).unwrap();
        assert!(input.throttle().enabled);
    }

    #[test]
    fn echo_writes_printable_chars_to_the_display() {
        let grid = Arc::new(Grid::new(2, 10));
        let input = InputCoordinator::new(ConsoleConfig {
            echo: true,
            ..unthrottled()
        })
        .unwrap()
        .with_display(grid.clone());
        input.attach();
        input.on_char_typed('o');
        input.on_char_typed('\u{8}');
        input.on_char_typed('k');
        assert_eq!(grid.cell_char(Location::new(0, 0)), Some('o'));
        assert_eq!(grid.cell_char(Location::new(0, 1)), Some('k'));
        // The control character is still delivered, just not echoed.
        assert_eq!(input.poll_char(Duration::ZERO), Some('o'));
        assert_eq!(input.poll_char(Duration::ZERO), Some('\u{8}'));
    }

    #[test]
    fn cursor_blinks_through_the_display() {
        let grid = Arc::new(Grid::new(1, 4));
        let input = active(unthrottled()).with_display(grid.clone());
        input.set_cursor_visible(true);
        assert_eq!(grid.rows()[0][0].ch, '|');

        let later = Instant::now() + Duration::from_secs(1);
        assert!(input.tick_cursor_blink(later));
        assert_eq!(grid.rows()[0][0].ch, ' ');
        assert!(!input.tick_cursor_blink(later));

        assert!(input.tick_cursor_blink(later + Duration::from_secs(1)));
        input.set_cursor_visible(false);
        assert_eq!(grid.rows()[0][0].ch, ' ');
    }

    #[test]
    fn every_poll_advances_the_blink() {
        let grid = Arc::new(Grid::new(1, 4));
        let input = active(ConsoleConfig {
            blink_period: Duration::from_millis(20),
            ..unthrottled()
        })
        .with_display(grid.clone());
        input.set_cursor_visible(true);
        assert_eq!(grid.rows()[0][0].ch, '|');

        let wait = Duration::from_millis(40);
        assert_eq!(input.poll_char(wait), None);
        assert_eq!(grid.rows()[0][0].ch, ' ');
        assert_eq!(input.poll_any_key(wait), KeyPoll::NoKey);
        assert_eq!(grid.rows()[0][0].ch, '|');
        assert_eq!(input.poll_mouse_event(wait), None);
        assert_eq!(grid.rows()[0][0].ch, ' ');
    }

    #[test]
    fn hidden_cursor_does_not_need_redraw() {
        let input = active(unthrottled());
        assert!(!input.is_cursor_visible());
        assert!(!input.is_echo());
        assert!(!input.tick_cursor_blink(Instant::now() + Duration::from_secs(10)));
    }
}
