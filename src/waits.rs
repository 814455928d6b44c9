//! Longer waits built from finite polls.
//!
//! The core polls never block for longer than the caller asks. These loops
//! keep polling in slices of the minimum poll interval until something
//! arrives, the deadline passes, or the session closes, so a closed session
//! can never leave a caller blocked.

use std::thread;
use std::time::{Duration, Instant};

use crate::coordinator::{InputCoordinator, Session};
use crate::event::{KeyPoll, Location, MouseKind};

const MIN_SLICE: Duration = Duration::from_millis(1);

impl InputCoordinator {
    /// Waits for a typed character. `None` waits until one arrives or the
    /// session closes.
    pub fn wait_char(&self, timeout: Option<Duration>) -> Option<char> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(c) = self.poll_char(self.slice_until(deadline)) {
                return Some(c);
            }
            if !self.keep_waiting(deadline) {
                return None;
            }
        }
    }

    /// Waits for a held key or pending mouse input. `None` waits until one
    /// shows up or the session closes.
    pub fn wait_key_pressed(&self, timeout: Option<Duration>) -> KeyPoll {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let poll = self.poll_any_key(self.slice_until(deadline));
            if poll != KeyPoll::NoKey || !self.keep_waiting(deadline) {
                return poll;
            }
        }
    }

    /// Blocks while `code` is held.
    pub fn wait_key_released(&self, code: u32) {
        while self.is_key_down(code) && self.session() != Session::Closed {
            thread::sleep(self.poll_slice());
        }
    }

    /// Polls for a key until `deadline`. When a key is found early, still
    /// returns no sooner than `deadline`, which gives game loops a fixed
    /// frame time.
    pub fn key_pressed_until(&self, deadline: Instant) -> KeyPoll {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return self.poll_any_key(Duration::ZERO);
        }
        let poll = self.wait_key_pressed(Some(remaining));
        if poll.key().is_some() {
            let left = deadline.saturating_duration_since(Instant::now());
            if !left.is_zero() {
                thread::sleep(left);
            }
        }
        poll
    }

    /// Waits until no key is held, then discards typed characters and mouse
    /// events.
    pub fn clear_all_input(&self) {
        while self.any_key_down() && self.session() != Session::Closed {
            thread::sleep(self.poll_slice());
        }
        self.discard_typed_and_mouse();
    }

    /// Next mouse event if it is of `kind`. An event of another kind is
    /// consumed and dropped.
    pub fn poll_mouse_event_of(&self, kind: MouseKind, timeout: Duration) -> Option<Location> {
        self.poll_mouse_event(timeout)
            .filter(|ev| ev.kind == kind)
            .map(|ev| ev.at)
    }

    fn poll_slice(&self) -> Duration {
        self.throttle().min_interval.max(MIN_SLICE)
    }

    fn slice_until(&self, deadline: Option<Instant>) -> Duration {
        let slice = self.poll_slice();
        match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()).min(slice),
            None => slice,
        }
    }

    fn keep_waiting(&self, deadline: Option<Instant>) -> bool {
        self.session() != Session::Closed && deadline.map_or(true, |d| Instant::now() < d)
    }
}
