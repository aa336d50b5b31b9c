//! Canonical logical keys and codepoint decoding.
//!
//! Escape sequences are resolved here, so the state machine dispatches
//! exactly one canonical key per physical keystroke and never re-enters
//! its own switch.

use std::io;

use super::tty::Tty;

const CTRL_N: char = '\u{0e}';
const CTRL_P: char = '\u{10}';
const CTRL_U: char = '\u{15}';
const CTRL_V: char = '\u{16}';
const CTRL_W: char = '\u{17}';
const BACKSPACE: char = '\u{7f}';
const CTRL_H: char = '\u{08}';
const ESCAPE: char = '\u{1b}';
const TAB: char = '\t';

/// One logical keystroke after sequence resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Confirm,
    Cancel,
    ToggleSelect,
    ClearQuery,
    Backspace,
    Char(char),
    Other,
}

/// Blocks until the terminal yields one logical key.
///
/// Retry signals from event backends (`Ok(None)`) never surface here. In
/// query mode `j`/`k` are ordinary printable input; without a query they
/// double as vi-style cursor movement.
pub fn next_key(tty: &mut dyn Tty, query_mode: bool) -> io::Result<Key> {
    let cp = next_codepoint(tty)?;
    let key = match cp {
        '\r' | '\n' => Key::Confirm,
        ESCAPE => decode_escape(tty)?,
        TAB | CTRL_N => Key::Down,
        CTRL_P => Key::Up,
        CTRL_V => Key::ToggleSelect,
        CTRL_U | CTRL_W => Key::ClearQuery,
        BACKSPACE | CTRL_H => Key::Backspace,
        'j' if !query_mode => Key::Down,
        'k' if !query_mode => Key::Up,
        char::REPLACEMENT_CHARACTER => Key::Other,
        c if !c.is_control() => Key::Char(c),
        _ => Key::Other,
    };
    Ok(key)
}

/// An Escape with nothing buffered behind it is a cancel; with follow bytes
/// it is the lead of a CSI sequence (`ESC [ params final`) or the SS3 form
/// (`ESC O A/B`). Arrow finals map to Up/Down; any other sequence is
/// consumed through its final byte and swallowed as `Other`, so parameter
/// bytes like the `3` and `~` of Delete never leak into the key stream.
fn decode_escape(tty: &mut dyn Tty) -> io::Result<Key> {
    if !tty.has_pending_input() {
        return Ok(Key::Cancel);
    }

    let lead = next_codepoint(tty)?;
    if lead != '[' && lead != 'O' {
        return Ok(Key::Other);
    }

    loop {
        match next_codepoint(tty)? {
            'A' => return Ok(Key::Up),
            'B' => return Ok(Key::Down),
            '\u{40}'..='\u{7e}' => return Ok(Key::Other),
            // Parameter byte; keep draining, but only while the rest of
            // the sequence is actually buffered.
            _ if tty.has_pending_input() => {}
            _ => return Ok(Key::Other),
        }
    }
}

fn next_codepoint(tty: &mut dyn Tty) -> io::Result<char> {
    loop {
        if let Some(cp) = tty.read_key()? {
            return Ok(cp);
        }
    }
}
