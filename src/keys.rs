//! Key codes used by the pressed-key set.
//!
//! Letters, digits and space use their uppercase ASCII value, named keys
//! follow the classic virtual-key numbering, so programs can compare against
//! either a constant or `'A' as u32`. Any other character is offset by
//! [`CHAR_BASE`] so it can never be mistaken for a named key.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const BACKSPACE: u32 = 8;
pub const TAB: u32 = 9;
pub const ENTER: u32 = 10;
pub const ESCAPE: u32 = 27;
pub const SPACE: u32 = 32;
pub const PAGE_UP: u32 = 33;
pub const PAGE_DOWN: u32 = 34;
pub const END: u32 = 35;
pub const HOME: u32 = 36;
pub const LEFT: u32 = 37;
pub const UP: u32 = 38;
pub const RIGHT: u32 = 39;
pub const DOWN: u32 = 40;
pub const DELETE: u32 = 127;
pub const INSERT: u32 = 155;
pub const F1: u32 = 112;

/// Offset for characters that have no key of their own, such as `%`.
pub const CHAR_BASE: u32 = 0x1_0000;

/// Code of the physical key behind a terminal key event.
pub fn key_code(code: KeyCode) -> Option<u32> {
    let mapped = match code {
        KeyCode::Backspace => BACKSPACE,
        KeyCode::Tab | KeyCode::BackTab => TAB,
        KeyCode::Enter => ENTER,
        KeyCode::Esc => ESCAPE,
        KeyCode::PageUp => PAGE_UP,
        KeyCode::PageDown => PAGE_DOWN,
        KeyCode::End => END,
        KeyCode::Home => HOME,
        KeyCode::Left => LEFT,
        KeyCode::Up => UP,
        KeyCode::Right => RIGHT,
        KeyCode::Down => DOWN,
        KeyCode::Delete => DELETE,
        KeyCode::Insert => INSERT,
        KeyCode::F(n @ 1..=12) => F1 + u32::from(n) - 1,
        KeyCode::Char(c) if c.is_ascii_alphanumeric() || c == ' ' => {
            c.to_ascii_uppercase() as u32
        }
        KeyCode::Char(c) => CHAR_BASE + c as u32,
        _ => return None,
    };
    Some(mapped)
}

/// Character produced by a key event, if it types one.
///
/// Editing keys produce their control character, like a text field would
/// see them. Control-modified letters type nothing.
pub fn typed_char(event: &KeyEvent) -> Option<char> {
    match event.code {
        KeyCode::Char(_) if event.modifiers.contains(KeyModifiers::CONTROL) => None,
        KeyCode::Char(c) => Some(c),
        KeyCode::Enter => Some('\n'),
        KeyCode::Tab => Some('\t'),
        KeyCode::Backspace => Some('\u{8}'),
        KeyCode::Esc => Some('\u{1b}'),
        _ => None,
    }
}
