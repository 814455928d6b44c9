//! Event sources and the pump that feeds them into an [`InputCoordinator`].
//!
//! The pump is the "event-dispatch thread" of the console: it reads terminal
//! events, translates them into grid coordinates and key codes, and calls the
//! coordinator's notification methods. The consumer thread never touches the
//! source directly.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self as ct_event, Event, KeyEvent, KeyEventKind, MouseEventKind};

use crate::coordinator::InputCoordinator;
use crate::event::{Location, MouseKind};
use crate::keys;

/// How long the pump waits for an event before checking its stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Without release reports, a key counts as held this long after its last
/// press or auto-repeat.
pub const SYNTHETIC_HOLD: Duration = Duration::from_millis(150);

/// Where terminal events come from.
pub trait EventSource {
    /// Whether an event is ready within `timeout`.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Next event. Only called after `poll` returned `true`.
    fn read(&mut self) -> io::Result<Event>;

    /// `true` once no event will ever arrive again.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// The real terminal, through crossterm.
#[derive(Debug, Default)]
pub struct TerminalSource;

impl EventSource for TerminalSource {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        ct_event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        ct_event::read()
    }
}

/// A fixed list of events, for driving the pump without a terminal.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    events: VecDeque<Event>,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl EventSource for ScriptedSource {
    fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read(&mut self) -> io::Result<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn is_exhausted(&self) -> bool {
        self.events.is_empty()
    }
}

/// Placement of the character grid on the terminal screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridArea {
    pub top: u16,
    pub left: u16,
    pub lines: u16,
    pub cols: u16,
}

impl GridArea {
    /// Grid cell under a terminal position, if any.
    pub fn locate(&self, row: u16, column: u16) -> Option<Location> {
        let line = row.checked_sub(self.top)?;
        let col = column.checked_sub(self.left)?;
        (line < self.lines && col < self.cols).then_some(Location::new(line, col))
    }
}

/// Translates terminal events into coordinator notifications.
#[derive(Debug)]
pub struct EventPump {
    input: Arc<InputCoordinator>,
    area: GridArea,
    release_reports: bool,
    pressed_at: Option<Location>,
    held: Option<(u32, Instant)>,
}

impl EventPump {
    /// `release_reports` says whether the terminal sends key release events;
    /// without them, keys are released after [`SYNTHETIC_HOLD`].
    pub fn new(input: Arc<InputCoordinator>, area: GridArea, release_reports: bool) -> Self {
        Self {
            input,
            area,
            release_reports,
            pressed_at: None,
            held: None,
        }
    }

    /// Pumps events until `stop` is set, the source runs dry or fails.
    /// Attaches the session on entry and closes it on exit, so a consumer
    /// waiting for input never outlives its source.
    pub fn run<S: EventSource>(&mut self, source: &mut S, stop: &AtomicBool) -> io::Result<()> {
        self.input.attach();
        let result = self.pump(source, stop);
        if let Err(err) = &result {
            log::error!("event source failed: {err}");
        }
        self.release_held();
        self.input.detach();
        result
    }

    fn pump<S: EventSource>(&mut self, source: &mut S, stop: &AtomicBool) -> io::Result<()> {
        while !stop.load(Ordering::Relaxed) && !source.is_exhausted() {
            if source.poll(POLL_INTERVAL)? {
                let event = source.read()?;
                self.handle(event, Instant::now());
            } else {
                self.expire_hold(Instant::now());
            }
        }
        Ok(())
    }

    /// Dispatches one terminal event.
    pub fn handle(&mut self, event: Event, now: Instant) {
        self.expire_hold(now);
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    /// Releases a synthetic hold that has run out.
    pub fn expire_hold(&mut self, now: Instant) {
        if let Some((_, since)) = self.held {
            if now.duration_since(since) >= SYNTHETIC_HOLD {
                self.release_held();
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let code = keys::key_code(key.code);
        match key.kind {
            KeyEventKind::Release => {
                if let Some(code) = code {
                    self.input.on_key_up(code);
                }
                return;
            }
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if let Some(code) = code {
                    self.press(code, now);
                }
            }
        }
        if let Some(c) = keys::typed_char(&key) {
            self.input.on_char_typed(c);
        }
    }

    fn press(&mut self, code: u32, now: Instant) {
        if !self.release_reports {
            match self.held {
                Some((held, _)) if held != code => self.release_held(),
                _ => {}
            }
            self.held = Some((code, now));
        }
        self.input.on_key_down(code);
    }

    fn release_held(&mut self) {
        if let Some((code, _)) = self.held.take() {
            self.input.on_key_up(code);
        }
    }

    fn handle_mouse(&mut self, mouse: ct_event::MouseEvent) {
        let Some(at) = self.area.locate(mouse.row, mouse.column) else {
            if matches!(mouse.kind, MouseEventKind::Up(_)) {
                self.pressed_at = None;
            }
            return;
        };
        match mouse.kind {
            MouseEventKind::Down(_) => {
                self.pressed_at = Some(at);
                self.input.on_mouse_event(MouseKind::Down, at.line, at.col);
            }
            MouseEventKind::Up(_) => {
                self.input.on_mouse_event(MouseKind::Up, at.line, at.col);
                if self.pressed_at.take() == Some(at) {
                    self.input.on_mouse_event(MouseKind::Click, at.line, at.col);
                }
            }
            MouseEventKind::Drag(_) => {
                self.input.on_mouse_event(MouseKind::Drag, at.line, at.col);
            }
            _ => {}
        }
    }
}
