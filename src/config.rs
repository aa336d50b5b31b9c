//! Session options and environment configuration.

use std::env;

use crate::core::filter::MatchSegment;
use crate::render::frame::HighlightStyle;

/// Immutable per-session configuration, built once at startup by the CLI
/// and passed to the session driver. Inner components never read ambient
/// state.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Incremental query filtering with a visible query line.
    pub query_mode: bool,
    /// Multi-select with Ctrl-V toggling.
    pub multi_select: bool,
    /// Case-fold query matching.
    pub case_insensitive: bool,
    /// Split lines once into display/payload segments.
    pub separator: Option<String>,
    /// Segment the query matches against.
    pub match_segment: MatchSegment,
    /// Fixed, unselectable rows at the top of the list.
    pub header_rows: usize,
    /// Cursor-row colors and highlight shape.
    pub highlight: HighlightStyle,
}

/// Maps a color name to its SGR foreground code; unknown names fall back
/// to black.
pub fn fg_color_code(name: &str) -> u8 {
    match name {
        "gray" | "black" => 30,
        "red" => 31,
        "green" => 32,
        "yellow" => 33,
        "blue" => 34,
        "magenta" => 35,
        "cyan" => 36,
        "white" => 37,
        _ => 30,
    }
}

/// Maps a color name to its SGR background code; unknown names fall back
/// to white.
pub fn bg_color_code(name: &str) -> u8 {
    match name {
        "gray" | "black" => 40,
        "red" => 41,
        "green" => 42,
        "yellow" => 43,
        "blue" => 44,
        "magenta" => 45,
        "cyan" => 46,
        "white" => 47,
        _ => 47,
    }
}

/// Debug knobs read from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Append every terminal write to this file.
    pub write_log: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            write_log: env_string_opt("PICKLINE_WRITE_LOG"),
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
