//! Terminal capability trait and lifecycle guard.

use std::io;

pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const ERASE_BELOW: &str = "\x1b[0J";

/// Minimal raw-terminal interface for the selector.
///
/// The session loop and state machine only ever talk to this trait; the
/// byte-stream (termios) and event-record (console) backends live behind it
/// and never leak platform branches upward.
pub trait Tty {
    /// Switch the device to raw mode: no canonical buffering, no echo, no
    /// signal-generating keys. Idempotent per session.
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Restore the mode captured at open time. Safe to call repeatedly and
    /// from cleanup paths; only the first call does work.
    fn restore(&mut self) -> io::Result<()>;

    /// Current viewport dimensions as (columns, rows). Implementations fall
    /// back to 80x25 when the query fails.
    fn size(&self) -> (u16, u16);

    /// Blocking read of one decoded input codepoint. `Ok(None)` means the
    /// backend discarded a non-key event (mouse, resize, key-up) and the
    /// caller should simply read again.
    fn read_key(&mut self) -> io::Result<Option<char>>;

    /// Whether decoded input is already buffered. Used to tell a bare
    /// Escape keypress apart from the lead byte of an arrow sequence.
    fn has_pending_input(&mut self) -> bool;

    /// Queue frame bytes for the next flush.
    fn write(&mut self, data: &str);

    /// Write all queued bytes to the device.
    fn flush(&mut self) -> io::Result<()>;

    /// Whether the device scrolls when the final buffer row is painted
    /// (observed on the Windows console); the renderer compensates with an
    /// extra newline so its cursor-up count stays correct.
    fn scrolls_on_last_row(&self) -> bool {
        false
    }
}

/// RAII guard that restores the terminal when dropped, so restoration runs
/// on every exit path out of a session, including panics.
pub struct TtyGuard<T: Tty> {
    tty: Option<T>,
}

impl<T: Tty> TtyGuard<T> {
    pub fn new(tty: T) -> Self {
        Self { tty: Some(tty) }
    }

    pub fn tty_mut(&mut self) -> &mut T {
        self.tty.as_mut().expect("terminal already taken from guard")
    }

    /// Consume the guard without running cleanup.
    pub fn into_inner(mut self) -> T {
        self.tty.take().expect("terminal already taken from guard")
    }
}

impl<T: Tty> Drop for TtyGuard<T> {
    fn drop(&mut self) {
        if let Some(tty) = self.tty.as_mut() {
            let _ = tty.restore();
        }
    }
}
