//! Text helpers (SGR token handling, width calculations, truncation).
//!
//! These helpers are pure (string in/string out) so both the render layer
//! and the session loop can use them without touching the terminal.

pub mod ansi;
pub mod truncate;
pub mod width;
