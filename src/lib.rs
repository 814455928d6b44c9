//! Input core of a character-grid console.
//!
//! A front end (terminal, window, test harness) runs an event source on its
//! own thread and reports keys and mouse gestures to an
//! [`InputCoordinator`]. The program on the other side polls for typed
//! characters, held keys and mouse events, each with a timeout and an
//! optional minimum poll interval that keeps busy loops from burning a core.
//!
//! ```
//! use std::time::Duration;
//! use chargrid_input::{ConsoleConfig, InputCoordinator, KeyPoll, Throttle};
//!
//! let input = InputCoordinator::new(ConsoleConfig {
//!     throttle: Throttle::disabled(),
//!     ..ConsoleConfig::default()
//! })
//! .unwrap();
//! input.attach();
//!
//! input.on_key_down(65);
//! assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::Key(65));
//! input.on_key_up(65);
//! assert_eq!(input.poll_any_key(Duration::ZERO), KeyPoll::NoKey);
//! ```

pub mod app;
pub mod config;
pub mod coordinator;
pub mod cursor;
pub mod display;
pub mod error;
pub mod event;
pub mod key_set;
pub mod keys;
pub mod ring;
pub mod source;
pub mod ui;
mod waits;

pub use config::{ConsoleConfig, MouseMode, Throttle};
pub use coordinator::{InputCoordinator, Session};
pub use cursor::CursorBlink;
pub use display::{Cell, Color, DisplaySink, Grid};
pub use error::ConfigError;
pub use event::{KeyPoll, Location, MouseEvent, MouseKind};
pub use key_set::KeySet;
pub use ring::{Overflow, RingBuffer};
